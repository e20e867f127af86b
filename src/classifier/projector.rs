//! 子系统投影：把多个子系统的变体规则同时应用到一个基因组
use rayon::prelude::*;
use rsvariant_engine::{is_active_code, RolePresence};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

use super::classifier::VariantClassifier;
use crate::config::{RuleConfig, RuleOptions};
use crate::error::RsvResult;

/// 单个子系统的投影结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionEntry {
    pub subsystem: String,
    pub variant: Option<String>,
}

/// 一个基因组在全部子系统上的投影
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub entries: Vec<ProjectionEntry>,
}

impl Projection {
    pub fn variant_of(&self, subsystem: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.subsystem == subsystem)
            .and_then(|e| e.variant.as_deref())
    }

    /// 分到活跃变体的子系统
    pub fn active(&self) -> impl Iterator<Item = &ProjectionEntry> {
        self.entries
            .iter()
            .filter(|e| e.variant.as_deref().is_some_and(is_active_code))
    }
}

/// 子系统投影器
#[derive(Debug, Clone)]
pub struct SubsystemProjector {
    classifiers: Vec<VariantClassifier>,
    parallel: bool,
}

impl Default for SubsystemProjector {
    fn default() -> Self {
        Self {
            classifiers: Vec::new(),
            parallel: true,
        }
    }
}

impl SubsystemProjector {
    pub fn new(classifiers: Vec<VariantClassifier>) -> Self {
        Self {
            classifiers,
            ..Self::default()
        }
    }

    /// 逐个加载子系统目录
    pub fn load<P: AsRef<Path>>(dirs: &[P], options: &RuleOptions) -> RsvResult<Self> {
        let start = Instant::now();
        let classifiers = dirs
            .iter()
            .map(|dir| {
                let config = RuleConfig {
                    options: options.clone(),
                    ..RuleConfig::subsystem_dir(dir.as_ref())
                };
                VariantClassifier::with_config(&config)
            })
            .collect::<RsvResult<Vec<_>>>()?;

        // 同名子系统会让 variant_of 只返回第一个
        let mut names = FxHashSet::default();
        for classifier in &classifiers {
            if !names.insert(classifier.name()) {
                log::warn!("Duplicate subsystem name: {}", classifier.name());
            }
        }
        log::info!(
            "Subsystem projector ready | Subsystems: {} | Time: {}ms",
            classifiers.len(),
            start.elapsed().as_millis()
        );
        Ok(Self::new(classifiers))
    }

    /// 是否并行投影（默认开启）
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn add(&mut self, classifier: VariantClassifier) {
        self.classifiers.push(classifier);
    }

    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }

    /// 投影一个基因组；结果顺序与子系统加载顺序一致
    pub fn project<R: RolePresence + Sync + ?Sized>(&self, roles: &R) -> Projection {
        let entries = if self.parallel {
            self.project_parallel(roles)
        } else {
            self.project_sequential(roles)
        };
        Projection { entries }
    }

    fn project_parallel<R: RolePresence + Sync + ?Sized>(&self, roles: &R) -> Vec<ProjectionEntry> {
        self.classifiers
            .par_iter()
            .map(|classifier| Self::entry(classifier, roles))
            .collect()
    }

    fn project_sequential<R: RolePresence + ?Sized>(&self, roles: &R) -> Vec<ProjectionEntry> {
        self.classifiers
            .iter()
            .map(|classifier| Self::entry(classifier, roles))
            .collect()
    }

    fn entry<R: RolePresence + ?Sized>(classifier: &VariantClassifier, roles: &R) -> ProjectionEntry {
        ProjectionEntry {
            subsystem: classifier.name().to_string(),
            variant: classifier.classify(roles).map(str::to_string),
        }
    }
}
