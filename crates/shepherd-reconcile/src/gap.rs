//! Gap detection — which nodes lack a given workload.

use shepherd_core::{Node, NodeId};

/// Compute the placement gap: the nodes with no running workload instance
/// whose definition identifier contains `workload_id`.
///
/// Matching is case-sensitive substring containment, so callers may pass
/// either a bare family name ("agent") or a versioned identifier
/// ("agent:v3"). First match wins per node. Known precision limitation: a
/// family name that is a substring of another family's identifier matches
/// both ("agent" also matches "agent-debug:1"), so such nodes are never
/// reported as gaps.
///
/// Output preserves the input node order. An empty node list yields an
/// empty gap.
pub fn compute_gap(nodes: &[Node], workload_id: &str) -> Vec<NodeId> {
    nodes
        .iter()
        .filter(|node| {
            !node
                .workloads
                .iter()
                .any(|instance| instance.definition.contains(workload_id))
        })
        .map(|node| node.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shepherd_core::{NodeStatus, WorkloadInstance};

    fn node(id: &str, definitions: &[&str]) -> Node {
        Node {
            id: id.to_string(),
            status: NodeStatus::Connected,
            workloads: definitions
                .iter()
                .enumerate()
                .map(|(i, d)| WorkloadInstance {
                    id: format!("{id}-task-{i}"),
                    definition: d.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn empty_node_list_yields_empty_gap() {
        assert!(compute_gap(&[], "agent").is_empty());
    }

    #[test]
    fn nodes_without_workload_are_the_gap() {
        let nodes = vec![
            node("a", &["agent:v3"]),
            node("b", &[]),
            node("c", &["log-shipper:1"]),
        ];
        assert_eq!(compute_gap(&nodes, "agent"), vec!["b", "c"]);
    }

    #[test]
    fn fully_covered_cluster_has_no_gap() {
        let nodes = vec![node("a", &["agent:v3"]), node("b", &["agent:v1"])];
        assert!(compute_gap(&nodes, "agent").is_empty());
    }

    #[test]
    fn versioned_request_matches_exact_definition_only() {
        let nodes = vec![node("a", &["agent:v3"]), node("b", &["agent:v1"])];
        assert_eq!(compute_gap(&nodes, "agent:v3"), vec!["b"]);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let nodes = vec![node("a", &["Agent:v3"])];
        assert_eq!(compute_gap(&nodes, "agent"), vec!["a"]);
    }

    #[test]
    fn family_substring_also_matches_longer_family() {
        // Documented imprecision: "agent" is contained in "agent-debug:1",
        // so node "a" is not reported as lacking "agent".
        let nodes = vec![node("a", &["agent-debug:1"]), node("b", &[])];
        assert_eq!(compute_gap(&nodes, "agent"), vec!["b"]);
    }

    #[test]
    fn output_preserves_input_order() {
        let nodes = vec![node("z", &[]), node("m", &[]), node("a", &[])];
        assert_eq!(compute_gap(&nodes, "agent"), vec!["z", "m", "a"]);
    }
}
