//! Named boolean conditions derived from the validated parameters.
//!
//! Conditions form a DAG: an expression may reference other conditions, so
//! the map is computed once per resolution call in dependency order obtained
//! from a topological sort. Nothing is lazily re-evaluated, which is what
//! makes the map deterministic for identical input.

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use tracing::debug;

use crate::error::ConsistencyError;
use crate::schema::{cond, Schema};
use crate::validate::ValidatedParameters;

/// A condition expression over parameters and previously defined conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Parameter value equals the literal.
    Equals(&'static str, &'static str),
    /// Parameter value differs from the literal.
    NotEquals(&'static str, &'static str),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    /// Reference to another named condition.
    Cond(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionDef {
    pub name: &'static str,
    pub expr: Expr,
}

/// Every named condition, fully evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionMap {
    values: BTreeMap<String, bool>,
}

impl ConditionMap {
    /// Look up a condition the caller requires. A missing key is a defect in
    /// the resolution logic and is never treated as `false`.
    pub fn require(&self, name: &str) -> Result<bool, ConsistencyError> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| ConsistencyError::UndefinedCondition(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// The template's condition table. Base conditions compare a parameter to its
/// disabled sentinel; derived ones combine base conditions. Each storage-class
/// transition is gated by the lifecycle master toggle.
pub fn builtin_conditions() -> Vec<ConditionDef> {
    fn on(param: &'static str) -> Expr {
        Expr::Equals(param, "true")
    }
    fn provided(param: &'static str) -> Expr {
        Expr::NotEquals(param, "")
    }
    fn gated(toggle: &'static str) -> Expr {
        Expr::And(vec![Expr::Cond(cond::LIFECYCLE_ENABLED), on(toggle)])
    }

    vec![
        ConditionDef {
            name: cond::ENABLE_KMS_ENCRYPTION,
            expr: provided("KmsMasterKeyArn"),
        },
        ConditionDef {
            name: cond::BUCKET_VERSIONING_ENABLED,
            expr: on("BucketVersioningEnabled"),
        },
        ConditionDef {
            name: cond::LIFECYCLE_ENABLED,
            expr: on("S3LifecycleConfigurationEnabled"),
        },
        ConditionDef {
            name: cond::TRANSITION_STANDARD_IA,
            expr: gated("TransitionToStandardIAEnabled"),
        },
        ConditionDef {
            name: cond::TRANSITION_INTELLIGENT_TIERING,
            expr: gated("TransitionToIntelligentTieringEnabled"),
        },
        ConditionDef {
            name: cond::TRANSITION_ONE_ZONE_IA,
            expr: gated("TransitionToOneZoneIAEnabled"),
        },
        ConditionDef {
            name: cond::TRANSITION_GLACIER_IR,
            expr: gated("TransitionToGlacierIREnabled"),
        },
        ConditionDef {
            name: cond::TRANSITION_GLACIER,
            expr: gated("TransitionToGlacierEnabled"),
        },
        ConditionDef {
            name: cond::TRANSITION_DEEP_ARCHIVE,
            expr: gated("TransitionToDeepArchiveEnabled"),
        },
        ConditionDef {
            name: cond::EXPIRATION_ENABLED,
            expr: gated("EnableExpiration"),
        },
        ConditionDef {
            name: cond::LAMBDA_NOTIFY_ENABLED,
            expr: provided("LambdaFunctionArn"),
        },
        ConditionDef {
            name: cond::HAS_NOTIFICATION_PREFIX,
            expr: provided("NotificationPrefix"),
        },
        ConditionDef {
            name: cond::HAS_NOTIFICATION_SUFFIX,
            expr: provided("NotificationSuffix"),
        },
        ConditionDef {
            name: cond::HAS_NOTIFICATION_FILTERS,
            expr: Expr::Or(vec![
                Expr::Cond(cond::HAS_NOTIFICATION_PREFIX),
                Expr::Cond(cond::HAS_NOTIFICATION_SUFFIX),
            ]),
        },
        ConditionDef {
            name: cond::HAS_VPC_ENDPOINT_RESTRICTION,
            expr: provided("S3VpcEndpointId"),
        },
        ConditionDef {
            name: cond::HAS_WHITELISTED_USER_ID,
            expr: provided("WhitelistedUserId"),
        },
        ConditionDef {
            name: cond::HAS_WHITELISTED_ROLE_ID,
            expr: provided("WhitelistedRoleId"),
        },
        ConditionDef {
            name: cond::HAS_IAM_ROLE_ACCESS,
            expr: provided("IAMRoleBaseName"),
        },
        ConditionDef {
            name: cond::HAS_CI_BUILD,
            expr: provided("CiBuild"),
        },
        ConditionDef {
            name: cond::HAS_GITHUB_METADATA,
            expr: Expr::Or(vec![provided("GitHubOrg"), provided("GitHubRepo")]),
        },
    ]
}

impl Schema {
    /// Evaluate every named condition against a validated parameter set.
    ///
    /// Deterministic and side-effect-free: the definitions are topologically
    /// sorted by their `Cond` references, then each is computed exactly once.
    /// Cycles and dangling references are `ConsistencyError`s.
    pub fn evaluate(
        &self,
        params: &ValidatedParameters,
    ) -> Result<ConditionMap, ConsistencyError> {
        let mut graph: DiGraph<&'static str, ()> = DiGraph::new();
        let mut index = BTreeMap::new();
        for def in &self.conditions {
            index.insert(def.name, graph.add_node(def.name));
        }
        for def in &self.conditions {
            let to = index[def.name];
            let mut deps = Vec::new();
            collect_refs(&def.expr, &mut deps);
            for dep in deps {
                let from = index
                    .get(dep)
                    .ok_or_else(|| ConsistencyError::UndefinedCondition(dep.to_string()))?;
                graph.add_edge(*from, to, ());
            }
        }

        let ordered = toposort(&graph, None)
            .map_err(|c| ConsistencyError::ConditionCycle(graph[c.node_id()].to_string()))?;

        let mut map = ConditionMap::default();
        for ix in ordered {
            let name = graph[ix];
            let def = self
                .conditions
                .iter()
                .find(|d| d.name == name)
                .ok_or_else(|| ConsistencyError::UndefinedCondition(name.to_string()))?;
            let value = eval(&def.expr, params, &map)?;
            debug!(condition = name, value, "condition evaluated");
            map.values.insert(name.to_string(), value);
        }
        Ok(map)
    }
}

fn collect_refs(expr: &Expr, out: &mut Vec<&'static str>) {
    match expr {
        Expr::Equals(..) | Expr::NotEquals(..) => {}
        Expr::And(xs) | Expr::Or(xs) => xs.iter().for_each(|x| collect_refs(x, out)),
        Expr::Not(x) => collect_refs(x, out),
        Expr::Cond(name) => out.push(name),
    }
}

fn eval(
    expr: &Expr,
    params: &ValidatedParameters,
    resolved: &ConditionMap,
) -> Result<bool, ConsistencyError> {
    Ok(match expr {
        Expr::Equals(param, literal) => params.get(param)? == *literal,
        Expr::NotEquals(param, literal) => params.get(param)? != *literal,
        Expr::And(xs) => {
            let mut all = true;
            for x in xs {
                all &= eval(x, params, resolved)?;
            }
            all
        }
        Expr::Or(xs) => {
            let mut any = false;
            for x in xs {
                any |= eval(x, params, resolved)?;
            }
            any
        }
        Expr::Not(x) => !eval(x, params, resolved)?,
        Expr::Cond(name) => resolved.require(name)?,
    })
}
