//! Task planner: expand entities into verification tasks, grouped by class, minus resumed work.
//!
//! The per-property policy is the [`RULES`] table; each rule says where URLs come from and
//! which class runs them.

use std::collections::{BTreeMap, HashSet};

use crate::engine::log_ops::SkipSet;
use crate::engine::tools::non_empty;
use crate::{Entity, PropertyType, TaskClass, VerificationTask};

/// One row of the planning policy.
pub struct PropertyRule {
    pub property: PropertyType,
    pub class: TaskClass,
    /// URLs to check for this property; empty when the property is unset.
    pub extract: fn(&Entity) -> Vec<String>,
}

fn single(value: Option<&str>) -> Vec<String> {
    non_empty(value).map(str::to_string).into_iter().collect()
}

fn each(values: Option<&Vec<String>>, to_url: impl Fn(&str) -> String) -> Vec<String> {
    values
        .into_iter()
        .flatten()
        .filter_map(|v| non_empty(Some(v.as_str())))
        .map(to_url)
        .collect()
}

fn website(e: &Entity) -> Vec<String> {
    single(e.url.as_deref())
}

fn referral(e: &Entity) -> Vec<String> {
    single(e.referral_url.as_deref())
}

fn twitter(e: &Entity) -> Vec<String> {
    single(e.twitter.as_deref())
        .into_iter()
        .map(|handle| format!("https://x.com/{handle}"))
        .collect()
}

fn github(e: &Entity) -> Vec<String> {
    each(e.github.as_ref(), |handle| format!("https://github.com/{handle}"))
}

fn audit_links(e: &Entity) -> Vec<String> {
    each(e.audit_links.as_ref(), str::to_string)
}

pub const RULES: [PropertyRule; 5] = [
    PropertyRule {
        property: PropertyType::Url,
        class: TaskClass::Default,
        extract: website,
    },
    PropertyRule {
        property: PropertyType::ReferralUrl,
        class: TaskClass::Default,
        extract: referral,
    },
    PropertyRule {
        property: PropertyType::Twitter,
        class: TaskClass::Twitter,
        extract: twitter,
    },
    PropertyRule {
        property: PropertyType::Github,
        class: TaskClass::Github,
        extract: github,
    },
    PropertyRule {
        property: PropertyType::AuditLink,
        class: TaskClass::Default,
        extract: audit_links,
    },
];

/// Tasks per class, in source order. Also counts what the skip-set removed.
#[derive(Debug, Default)]
pub struct TaskPlan {
    by_class: BTreeMap<TaskClass, Vec<VerificationTask>>,
    pub skipped: usize,
}

impl TaskPlan {
    pub fn tasks(&self, class: TaskClass) -> &[VerificationTask] {
        self.by_class.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn take(&mut self, class: TaskClass) -> Vec<VerificationTask> {
        self.by_class.remove(&class).unwrap_or_default()
    }

    /// Planned tasks for one property, across classes.
    pub fn count_property(&self, property: PropertyType) -> usize {
        self.by_class
            .values()
            .flatten()
            .filter(|t| t.property == property)
            .count()
    }

    pub fn total(&self) -> usize {
        self.by_class.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskClass, &[VerificationTask])> {
        self.by_class.iter().map(|(c, t)| (*c, t.as_slice()))
    }
}

/// Expand `entities` into tasks, leaving out anything `skip` already holds.
/// Repeated URLs under one entity property collapse to one task.
pub fn plan_tasks(entities: &[Entity], skip: &SkipSet) -> TaskPlan {
    let mut plan = TaskPlan::default();
    for entity in entities {
        for rule in &RULES {
            let mut seen = HashSet::new();
            for url in (rule.extract)(entity) {
                if !seen.insert(url.clone()) {
                    continue;
                }
                if skip.contains(&entity.id, rule.property, &url) {
                    plan.skipped += 1;
                    continue;
                }
                plan.by_class
                    .entry(rule.class)
                    .or_default()
                    .push(VerificationTask {
                        entity_id: entity.id.clone(),
                        entity_name: entity.name.clone(),
                        entity_tvl: entity.tvl,
                        property: rule.property,
                        url,
                    });
            }
        }
    }
    plan
}
