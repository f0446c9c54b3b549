//! Building proxies from remote descriptors, and keeping their field tables
//! in step with structural diffs.

use std::collections::{BTreeMap, HashMap};
use std::rc::{Rc, Weak};

use remirror_wire::{
    DictDiff, DictInfo, InstanceInfo, Key, ListDiff, ListInfo, ProxyKind, Reference, TypeInfo,
    WireValue,
};

use crate::client::Client;
use crate::config::DescriptorPolicy;
use crate::{Error, Proxy, Result, Value};

/// The members of a remote instance type.
#[derive(Debug, Default, PartialEq)]
pub struct InstanceSchema {
    pub type_name: String,
    pub attributes: Vec<String>,
    pub methods: Vec<String>,
    pub events: Vec<String>,

    /// Placeholder values shown while an attribute is being fetched.
    pub defaults: HashMap<String, WireValue>,
}

impl InstanceSchema {
    /// A schema that knows only its type name.
    pub fn named(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn from_info(info: &InstanceInfo) -> Self {
        let attributes = info.attribute_names.clone().unwrap_or_default();
        let defaults = match &info.attribute_values {
            Some(values) => attributes.iter().cloned().zip(values.iter().cloned()).collect(),
            None => HashMap::new(),
        };
        Self {
            type_name: info.type_name.clone(),
            methods: info.method_names.clone().unwrap_or_default(),
            events: info.event_names.clone().unwrap_or_default(),
            attributes,
            defaults,
        }
    }

    pub fn is_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }

    pub fn is_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m == name)
    }

    pub fn is_event(&self, name: &str) -> bool {
        self.events.iter().any(|e| e == name)
    }
}

/// A cache entry: an unmarshaled value, or a wire value seeded by a
/// descriptor or diff and unmarshaled on first read.
#[derive(Clone, Debug)]
pub(crate) enum Slot {
    Ready(Value),
    Saved(WireValue),
}

/// The field table behind a proxy.
#[derive(Debug)]
pub(crate) enum Fields {
    Instance {
        schema: Rc<InstanceSchema>,
        cache: HashMap<String, Slot>,
    },
    List(Vec<Option<Slot>>),
    Dict(BTreeMap<Key, Option<Slot>>),
}

impl Fields {
    pub(crate) fn instance(schema: Rc<InstanceSchema>) -> Self {
        Fields::Instance {
            schema,
            cache: HashMap::new(),
        }
    }

    pub(crate) fn empty(kind: ProxyKind) -> Self {
        match kind {
            ProxyKind::Instance => Fields::instance(Rc::new(InstanceSchema::default())),
            ProxyKind::List => Fields::List(Vec::new()),
            ProxyKind::Dict => Fields::Dict(BTreeMap::new()),
        }
    }

    pub(crate) fn from_list(info: &ListInfo) -> Self {
        Fields::List(list_slots(info))
    }

    pub(crate) fn from_dict(info: &DictInfo) -> Self {
        Fields::Dict(
            info.entries()
                .map(|(key, value)| (key.clone(), value.cloned().map(Slot::Saved)))
                .collect(),
        )
    }
}

fn list_slots(info: &ListInfo) -> Vec<Option<Slot>> {
    let data = info.items();
    (0..info.length.max(data.len()))
        .map(|i| data.get(i).cloned().map(Slot::Saved))
        .collect()
}

fn seeded(added: &[WireValue]) -> impl Iterator<Item = Option<Slot>> + '_ {
    added.iter().cloned().map(|value| Some(Slot::Saved(value)))
}

/// Apply a list diff to a list's slots in place.
pub(crate) fn apply_list_diff(items: &mut Vec<Option<Slot>>, diff: &ListDiff) -> Result<()> {
    match diff {
        ListDiff::Splice {
            index,
            removed,
            added,
        } => {
            let end = index
                .checked_add(*removed)
                .filter(|end| *end <= items.len())
                .ok_or_else(|| {
                    Error::malformed_diff(format!(
                        "splice of {} at {} on a list of {}",
                        removed,
                        index,
                        items.len()
                    ))
                })?;
            let _replaced: Vec<_> = items.splice(*index..end, seeded(added)).collect();
        }

        ListDiff::Strided {
            start,
            stop,
            step,
            removed,
            added,
        } => {
            if *step == 0 {
                return Err(Error::malformed_diff("strided diff with a zero step"));
            }
            if *removed > added.len() {
                // Deletion: back to front so earlier positions stay valid.
                let stop = (*stop).min(items.len());
                let positions: Vec<usize> = (*start..stop).step_by(*step).collect();
                for position in positions.into_iter().rev() {
                    items.remove(position);
                }
            } else {
                let len = items.len();
                for (i, value) in added.iter().enumerate() {
                    let position = i
                        .checked_mul(*step)
                        .and_then(|offset| offset.checked_add(*start))
                        .ok_or_else(|| Error::malformed_diff("strided write position overflows"))?;
                    let slot = items.get_mut(position).ok_or_else(|| {
                        Error::malformed_diff(format!(
                            "strided write at {} on a list of {}",
                            position, len
                        ))
                    })?;
                    *slot = Some(Slot::Saved(value.clone()));
                }
            }
        }
    }
    Ok(())
}

/// Apply a dict diff in place: removals first, then additions, which also
/// carry changed keys.
pub(crate) fn apply_dict_diff(items: &mut BTreeMap<Key, Option<Slot>>, diff: &DictDiff) {
    for key in &diff.removed {
        items.remove(key);
    }
    for (key, value) in diff.added.entries() {
        items.insert(key.clone(), value.cloned().map(Slot::Saved));
    }
}

/// Creates proxies and remembers instance types.
pub struct ProxyFactory {
    policy: DescriptorPolicy,
    types: HashMap<String, Rc<InstanceSchema>>,
}

impl ProxyFactory {
    pub fn new(policy: DescriptorPolicy) -> Self {
        Self {
            policy,
            types: HashMap::new(),
        }
    }

    /// Build a schema from a full descriptor and, under the per-type policy,
    /// keep it for later abbreviated descriptors of the same type.
    pub fn remember(&mut self, info: &InstanceInfo) -> Option<Rc<InstanceSchema>> {
        if !info.is_complete() {
            return None;
        }
        let schema = Rc::new(InstanceSchema::from_info(info));
        if self.policy == DescriptorPolicy::PerType
            && self
                .types
                .insert(info.type_name.clone(), Rc::clone(&schema))
                .is_none()
        {
            tracing::debug!(type_name = %info.type_name, "Learned instance type");
        }
        Some(schema)
    }

    /// The schema a descriptor stands for, if it can be known locally.
    pub fn resolve(&mut self, info: Option<&InstanceInfo>) -> Option<Rc<InstanceSchema>> {
        match info {
            Some(info) if info.is_complete() => self.remember(info),
            Some(info) if self.policy == DescriptorPolicy::PerType => {
                self.types.get(&info.type_name).cloned()
            }
            _ => None,
        }
    }

    pub fn known_type(&self, type_name: &str) -> Option<Rc<InstanceSchema>> {
        self.types.get(type_name).cloned()
    }

    /// Create the proxy for `reference`. A proxy whose descriptor is not
    /// available locally is created undescribed.
    pub(crate) fn create_proxy(&mut self, owner: Weak<Client>, reference: &Reference) -> Proxy {
        let (fields, described) = match (reference.kind, &reference.info) {
            (ProxyKind::Instance, info) => {
                let info = match info {
                    Some(TypeInfo::Instance(info)) => Some(info),
                    _ => None,
                };
                match self.resolve(info) {
                    Some(schema) => (Fields::instance(schema), true),
                    None => {
                        let type_name = info.map(|i| i.type_name.clone()).unwrap_or_default();
                        (
                            Fields::instance(Rc::new(InstanceSchema::named(type_name))),
                            false,
                        )
                    }
                }
            }
            (ProxyKind::List, Some(TypeInfo::List(info))) => (Fields::from_list(info), true),
            (ProxyKind::Dict, Some(TypeInfo::Dict(info))) => (Fields::from_dict(info), true),
            (kind, _) => (Fields::empty(kind), false),
        };
        Proxy::new(reference.kind, reference.id.clone(), owner, fields, described)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn list_of(values: &[i64]) -> Vec<Option<Slot>> {
        values
            .iter()
            .map(|v| Some(Slot::Saved(WireValue::primitive(*v))))
            .collect()
    }

    fn contents(items: &[Option<Slot>]) -> Vec<Option<serde_json::Value>> {
        items
            .iter()
            .map(|slot| match slot {
                Some(Slot::Saved(WireValue::Primitive(v))) => Some(v.clone()),
                Some(Slot::Ready(Value::Primitive(v))) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn splice_replaces_in_place() {
        let mut items = list_of(&[10, 20, 30]);
        let diff = ListDiff::Splice {
            index: 1,
            removed: 1,
            added: vec![WireValue::primitive(99)],
        };
        apply_list_diff(&mut items, &diff).unwrap();
        assert_eq!(
            contents(&items),
            vec![Some(json!(10)), Some(json!(99)), Some(json!(30))]
        );
    }

    #[test]
    fn splice_inserts_and_appends() {
        let mut items = list_of(&[1]);
        let insert = ListDiff::Splice {
            index: 0,
            removed: 0,
            added: vec![WireValue::primitive(0)],
        };
        let append = ListDiff::Splice {
            index: 2,
            removed: 0,
            added: vec![WireValue::primitive(2)],
        };
        apply_list_diff(&mut items, &insert).unwrap();
        apply_list_diff(&mut items, &append).unwrap();
        assert_eq!(
            contents(&items),
            vec![Some(json!(0)), Some(json!(1)), Some(json!(2))]
        );
    }

    #[test]
    fn splice_out_of_range_is_malformed() {
        let mut items = list_of(&[1, 2]);
        let diff = ListDiff::Splice {
            index: 1,
            removed: 5,
            added: vec![],
        };
        assert!(matches!(
            apply_list_diff(&mut items, &diff),
            Err(Error::MalformedDiff { .. })
        ));
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn strided_delete_renumbers() {
        let mut items = list_of(&[0, 1, 2, 3, 4, 5]);
        let diff = ListDiff::Strided {
            start: 0,
            stop: 6,
            step: 2,
            removed: 3,
            added: vec![],
        };
        apply_list_diff(&mut items, &diff).unwrap();
        assert_eq!(
            contents(&items),
            vec![Some(json!(1)), Some(json!(3)), Some(json!(5))]
        );
    }

    #[test]
    fn strided_replace_overwrites() {
        let mut items = list_of(&[0, 1, 2, 3]);
        let diff = ListDiff::Strided {
            start: 1,
            stop: 4,
            step: 2,
            removed: 2,
            added: vec![WireValue::primitive(-1), WireValue::primitive(-3)],
        };
        apply_list_diff(&mut items, &diff).unwrap();
        assert_eq!(
            contents(&items),
            vec![Some(json!(0)), Some(json!(-1)), Some(json!(2)), Some(json!(-3))]
        );
    }

    #[test]
    fn zero_step_is_malformed() {
        let mut items = list_of(&[0]);
        let diff = ListDiff::Strided {
            start: 0,
            stop: 1,
            step: 0,
            removed: 1,
            added: vec![],
        };
        assert!(apply_list_diff(&mut items, &diff).is_err());
    }

    #[test]
    fn huge_step_is_malformed() {
        let mut items = list_of(&[0, 1, 2]);
        let diff = ListDiff::Strided {
            start: 1,
            stop: 3,
            step: usize::MAX,
            removed: 2,
            added: vec![WireValue::primitive(7), WireValue::primitive(8)],
        };
        assert!(matches!(
            apply_list_diff(&mut items, &diff),
            Err(Error::MalformedDiff { .. })
        ));
    }

    #[test]
    fn strided_write_past_the_end_is_malformed() {
        let mut items = list_of(&[0, 1]);
        let diff = ListDiff::Strided {
            start: 0,
            stop: 4,
            step: 3,
            removed: 2,
            added: vec![WireValue::primitive(7), WireValue::primitive(8)],
        };
        let error = apply_list_diff(&mut items, &diff).unwrap_err();
        assert!(error.to_string().contains("on a list of 2"));
    }

    #[test]
    fn dict_diff_adds_and_removes() {
        let mut items: BTreeMap<Key, Option<Slot>> = BTreeMap::new();
        items.insert(Key::from("k3"), None);
        let diff = DictDiff {
            removed: vec![Key::from("k3")],
            added: DictInfo::with_entries(vec![
                (Key::from("k1"), WireValue::primitive(1)),
                (Key::from("k2"), WireValue::primitive(2)),
            ]),
        };
        apply_dict_diff(&mut items, &diff);
        let keys: Vec<_> = items.keys().cloned().collect();
        assert_eq!(keys, vec![Key::from("k1"), Key::from("k2")]);
        assert!(items.values().all(Option::is_some));
    }

    #[test]
    fn list_fields_pad_to_length() {
        let Fields::List(items) = Fields::from_list(&ListInfo::with_length(3)) else {
            panic!("expected list fields");
        };
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(Option::is_none));
    }

    #[test]
    fn schema_defaults_follow_attribute_names() {
        let info = InstanceInfo {
            attribute_values: Some(vec![WireValue::primitive("?"), WireValue::primitive(0)]),
            ..InstanceInfo::named("Person").with_attributes(["name", "age"])
        };
        let schema = InstanceSchema::from_info(&info);
        assert_eq!(schema.defaults.get("age"), Some(&WireValue::primitive(0)));
        assert!(schema.is_attribute("name"));
        assert!(!schema.is_method("name"));
    }

    #[test]
    fn per_type_policy_resolves_abbreviated_descriptors() {
        let mut factory = ProxyFactory::new(DescriptorPolicy::PerType);
        let full = InstanceInfo::named("Person").with_attributes(["name"]);
        let first = factory.resolve(Some(&full)).unwrap();
        let again = factory.resolve(Some(&InstanceInfo::named("Person"))).unwrap();
        assert!(Rc::ptr_eq(&first, &again));
        assert!(factory.resolve(Some(&InstanceInfo::named("Dog"))).is_none());
    }

    #[test]
    fn per_instance_policy_keeps_no_types() {
        let mut factory = ProxyFactory::new(DescriptorPolicy::PerInstance);
        let full = InstanceInfo::named("Person").with_attributes(["name"]);
        assert!(factory.resolve(Some(&full)).is_some());
        assert!(factory.resolve(Some(&InstanceInfo::named("Person"))).is_none());
        assert!(factory.known_type("Person").is_none());
    }
}
