//! Retarget planning
//!
//! Every matched datasource is assigned to exactly one cluster per domain.

use crate::types::{RetargetInstruction, TargetDescriptor};

/// Build one cluster retarget instruction per datasource name
pub fn plan<I, S>(matched_names: I, cluster_name: &str) -> Vec<RetargetInstruction>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    matched_names
        .into_iter()
        .map(|name| RetargetInstruction {
            datasource_name: name.into(),
            target: TargetDescriptor::cluster(cluster_name),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TargetKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plan_single() {
        let plan = plan(["DS1"], "MyCluster");
        assert_eq!(
            plan,
            vec![RetargetInstruction {
                datasource_name: "DS1".to_string(),
                target: TargetDescriptor::cluster("MyCluster"),
            }]
        );
    }

    #[test]
    fn test_plan_preserves_order_and_kind() {
        let names = vec!["B".to_string(), "A".to_string(), "C".to_string()];
        let plan = plan(names, "C1");
        let ordered: Vec<&str> = plan.iter().map(|i| i.datasource_name.as_str()).collect();
        assert_eq!(ordered, vec!["B", "A", "C"]);
        assert!(plan
            .iter()
            .all(|i| i.target.kind == TargetKind::Cluster && i.target.name == "C1"));
    }

    #[test]
    fn test_plan_empty() {
        assert!(plan(Vec::<String>::new(), "C1").is_empty());
    }
}
