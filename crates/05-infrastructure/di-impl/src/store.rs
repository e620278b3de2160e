//! 实例存储
//!
//! 单例按具体类型缓存，实例一旦登记就不会被替换；每次请求实例不缓存，
//! 只按实例标识跟踪装配状态。

use infrastructure_common::{ComponentRef, Scope, WiringState};
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::warn;

/// 单例记录
#[derive(Debug, Clone)]
struct SingletonRecord {
    instance: ComponentRef,
    state: WiringState,
}

/// 每次请求实例的状态记录
struct InstanceRecord {
    instance: Weak<dyn Any + Send + Sync>,
    state: WiringState,
}

/// 实例存储
///
/// 锁只在单次读写期间持有，递归装配期间不持有任何锁。
#[derive(Default)]
pub struct InstanceStore {
    singletons: Mutex<HashMap<TypeId, SingletonRecord>>,
    per_request: Mutex<HashMap<usize, InstanceRecord>>,
}

impl InstanceStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 查找单例及其装配状态
    pub fn lookup(&self, type_id: TypeId) -> Option<(ComponentRef, WiringState)> {
        self.singletons
            .lock()
            .get(&type_id)
            .map(|record| (record.instance.clone(), record.state))
    }

    /// 登记单例
    ///
    /// 同类型已有实例时保留原实例并返回它。
    pub fn insert_singleton(&self, instance: ComponentRef, state: WiringState) -> ComponentRef {
        let type_id = instance.component().type_info().id;
        let mut singletons = self.singletons.lock();

        if let Some(existing) = singletons.get(&type_id) {
            warn!(
                "单例 {} 已存在，保留原实例",
                instance.component().type_info().short_name()
            );
            return existing.instance.clone();
        }

        singletons.insert(type_id, SingletonRecord {
            instance: instance.clone(),
            state,
        });
        instance
    }

    /// 查询装配状态：单例按类型，每次请求实例按实例
    pub fn state_of(&self, instance: &ComponentRef) -> WiringState {
        match instance.component().scope() {
            Scope::Singleton => self
                .singletons
                .lock()
                .get(&instance.component().type_info().id)
                .map_or(WiringState::NotStarted, |record| record.state),
            Scope::PerRequest => self
                .per_request
                .lock()
                .get(&instance.identity())
                .filter(|record| record.instance.strong_count() > 0)
                .map_or(WiringState::NotStarted, |record| record.state),
        }
    }

    /// 开始装配：仅当状态为 `NotStarted` 时置为 `InProgress` 并返回 `true`
    pub fn begin_wiring(&self, instance: &ComponentRef) -> bool {
        match instance.component().scope() {
            Scope::Singleton => {
                let mut singletons = self.singletons.lock();
                let record = singletons
                    .entry(instance.component().type_info().id)
                    .or_insert_with(|| SingletonRecord {
                        instance: instance.clone(),
                        state: WiringState::NotStarted,
                    });
                if record.state != WiringState::NotStarted {
                    return false;
                }
                record.state = WiringState::InProgress;
                true
            }
            Scope::PerRequest => {
                let mut per_request = self.per_request.lock();
                per_request.retain(|_, record| record.instance.strong_count() > 0);

                let identity = instance.identity();
                if per_request.contains_key(&identity) {
                    return false;
                }
                per_request.insert(identity, InstanceRecord {
                    instance: Arc::downgrade(instance.instance()),
                    state: WiringState::InProgress,
                });
                true
            }
        }
    }

    /// 标记装配完成
    pub fn complete(&self, instance: &ComponentRef) {
        match instance.component().scope() {
            Scope::Singleton => {
                if let Some(record) = self
                    .singletons
                    .lock()
                    .get_mut(&instance.component().type_info().id)
                {
                    record.state = WiringState::Complete;
                }
            }
            Scope::PerRequest => {
                if let Some(record) = self.per_request.lock().get_mut(&instance.identity()) {
                    record.state = WiringState::Complete;
                }
            }
        }
    }

    /// 放弃装配：装配失败后单例回到 `NotStarted`，每次请求实例的记录被移除
    ///
    /// 之后再次解析会重新装配并重新报告同样的错误，而不是返回未装配完的实例。
    pub fn abandon(&self, instance: &ComponentRef) {
        match instance.component().scope() {
            Scope::Singleton => {
                if let Some(record) = self
                    .singletons
                    .lock()
                    .get_mut(&instance.component().type_info().id)
                {
                    if record.state == WiringState::InProgress {
                        record.state = WiringState::NotStarted;
                    }
                }
            }
            Scope::PerRequest => {
                self.per_request.lock().remove(&instance.identity());
            }
        }
    }

    /// 单例数量
    pub fn singleton_count(&self) -> usize {
        self.singletons.lock().len()
    }

    /// 已装配完成的单例数量
    pub fn wired_singleton_count(&self) -> usize {
        self.singletons
            .lock()
            .values()
            .filter(|record| record.state == WiringState::Complete)
            .count()
    }

    /// 清空存储
    pub fn clear(&self) {
        self.singletons.lock().clear();
        self.per_request.lock().clear();
    }
}
