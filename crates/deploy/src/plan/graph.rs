//! Topological ordering of plan steps.

use std::collections::{BTreeSet, HashMap};

use super::{DeploymentPlan, PlanStep, StepName};
use crate::error::{DeployError, DeployResult};

impl DeploymentPlan {
    /// Derive the execution order of the plan.
    ///
    /// Uses Kahn's algorithm. Among steps whose dependencies are all satisfied,
    /// the one declared first runs first, so a plan already written in
    /// dependency order executes exactly as declared.
    ///
    /// Fails on duplicate step names, references to unknown steps, address
    /// references to steps that do not deploy a contract, and cycles.
    pub fn execution_order(&self) -> DeployResult<Vec<&PlanStep>> {
        let mut index: HashMap<&StepName, usize> = HashMap::with_capacity(self.steps.len());
        for (i, step) in self.steps.iter().enumerate() {
            if index.insert(&step.name, i).is_some() {
                return Err(DeployError::plan(format!("duplicate step name {}", step.name)));
            }
        }

        let mut dependents: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); self.steps.len()];
        let mut in_degree = vec![0usize; self.steps.len()];

        for (i, step) in self.steps.iter().enumerate() {
            for dep in step.address_dependencies() {
                let &j = index.get(dep).ok_or_else(|| {
                    DeployError::plan(format!("step {} references unknown step {dep}", step.name))
                })?;
                if !self.steps[j].is_deploy() {
                    return Err(DeployError::plan(format!(
                        "step {} uses the address of {dep}, which does not deploy a contract",
                        step.name
                    )));
                }
            }

            let deps: BTreeSet<usize> = step
                .dependencies()
                .into_iter()
                .map(|dep| {
                    index.get(dep).copied().ok_or_else(|| {
                        DeployError::plan(format!(
                            "step {} must run after unknown step {dep}",
                            step.name
                        ))
                    })
                })
                .collect::<DeployResult<_>>()?;

            in_degree[i] = deps.len();
            for j in deps {
                dependents[j].insert(i);
            }
        }

        let mut ready: BTreeSet<usize> = (0..self.steps.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.steps.len());

        while let Some(i) = ready.pop_first() {
            order.push(&self.steps[i]);
            for &k in &dependents[i] {
                in_degree[k] -= 1;
                if in_degree[k] == 0 {
                    ready.insert(k);
                }
            }
        }

        if order.len() != self.steps.len() {
            let blocked: Vec<String> = self
                .steps
                .iter()
                .zip(&in_degree)
                .filter(|(_, degree)| **degree > 0)
                .map(|(step, _)| step.name.to_string())
                .collect();
            return Err(DeployError::plan(format!(
                "dependency cycle between steps: {}",
                blocked.join(", ")
            )));
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Arg, ArtifactRef};

    fn artifact(name: &str) -> ArtifactRef {
        ArtifactRef::new(format!("{name}.sol"), name)
    }

    fn names(order: &[&PlanStep]) -> Vec<String> {
        order.iter().map(|step| step.name.to_string()).collect()
    }

    #[test]
    fn test_declared_order_is_kept_when_valid() {
        let plan = DeploymentPlan::new()
            .deploy("factory", artifact("Factory"), vec![Arg::Signer])
            .deploy("router", artifact("Router"), vec![Arg::contract("factory")])
            .deploy("bud_minter", artifact("BudMinter"), vec![])
            .deploy("stats", artifact("Stats"), vec![Arg::contract("bud_minter")]);

        let order = plan.execution_order().unwrap();
        assert_eq!(names(&order), vec!["factory", "router", "bud_minter", "stats"]);
    }

    #[test]
    fn test_dependencies_are_hoisted() {
        let plan = DeploymentPlan::new()
            .deploy("router", artifact("Router"), vec![Arg::contract("factory")])
            .deploy("token", artifact("Token"), vec![])
            .deploy("factory", artifact("Factory"), vec![]);

        let order = plan.execution_order().unwrap();
        assert_eq!(names(&order), vec!["token", "factory", "router"]);
    }

    #[test]
    fn test_after_constraint() {
        let plan = DeploymentPlan::new()
            .deploy("a", artifact("A"), vec![])
            .after("b")
            .deploy("b", artifact("B"), vec![]);

        let order = plan.execution_order().unwrap();
        assert_eq!(names(&order), vec!["b", "a"]);
    }

    #[test]
    fn test_cycle_is_detected() {
        let plan = DeploymentPlan::new()
            .deploy("root", artifact("Root"), vec![])
            .deploy("a", artifact("A"), vec![Arg::contract("b")])
            .deploy("b", artifact("B"), vec![Arg::contract("a")]);

        let err = plan.execution_order().unwrap_err().to_string();
        assert!(err.contains("cycle"), "{err}");
        assert!(err.contains("a, b"), "{err}");
        assert!(!err.contains("root"), "{err}");
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let plan = DeploymentPlan::new().deploy("a", artifact("A"), vec![Arg::contract("a")]);
        assert!(plan.execution_order().is_err());
    }

    #[test]
    fn test_unknown_reference() {
        let plan = DeploymentPlan::new().deploy("router", artifact("Router"), vec![Arg::contract(
            "factory",
        )]);

        let err = plan.execution_order().unwrap_err().to_string();
        assert!(err.contains("unknown step factory"), "{err}");
    }

    #[test]
    fn test_duplicate_names() {
        let plan = DeploymentPlan::new()
            .deploy("a", artifact("A"), vec![])
            .deploy("a", artifact("A"), vec![]);

        let err = plan.execution_order().unwrap_err().to_string();
        assert!(err.contains("duplicate"), "{err}");
    }

    #[test]
    fn test_address_of_invoke_step_is_rejected() {
        let plan = DeploymentPlan::new()
            .deploy("stats", artifact("Stats"), vec![])
            .invoke("wire", "stats", "addMinter(address)", vec![Arg::Signer])
            .deploy("game", artifact("Game"), vec![Arg::contract("wire")]);

        let err = plan.execution_order().unwrap_err().to_string();
        assert!(err.contains("does not deploy a contract"), "{err}");
    }

    #[test]
    fn test_repeated_reference_counts_once() {
        let plan = DeploymentPlan::new()
            .deploy("token", artifact("Token"), vec![])
            .deploy(
                "pair",
                artifact("Pair"),
                vec![Arg::contract("token"), Arg::contract("token")],
            );

        let order = plan.execution_order().unwrap();
        assert_eq!(names(&order), vec!["token", "pair"]);
    }
}
