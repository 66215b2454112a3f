//! Resource schemas
//!
//! A [`Schema`] declares every attribute a resource tracks along with its
//! presence rules (required, optional, computed), plan-time behavior
//! (force-new, defaults) and validation.

use crate::error::Diagnostic;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub type ValidateFn = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;
pub type NormalizeFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    Bool,
    Int,
    Float,
    String,
    List,
    Set,
    Map,
}

#[derive(Clone)]
pub struct Attribute {
    pub ty: AttrType,
    /// Element type of lists, sets and maps.
    pub elem: AttrType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub default: Option<Value>,
    pub force_new: bool,
    pub sensitive: bool,
    pub conflicts_with: Vec<&'static str>,
    pub max_items: Option<usize>,
    /// Element schema of a block list or set.
    pub nested: Option<Schema>,
    pub description: &'static str,
    validator: Option<ValidateFn>,
    normalizer: Option<NormalizeFn>,
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("ty", &self.ty)
            .field("elem", &self.elem)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("default", &self.default)
            .field("force_new", &self.force_new)
            .field("nested", &self.nested)
            .finish_non_exhaustive()
    }
}

impl Attribute {
    fn of(ty: AttrType, elem: AttrType) -> Self {
        Self {
            ty,
            elem,
            required: false,
            optional: false,
            computed: false,
            default: None,
            force_new: false,
            sensitive: false,
            conflicts_with: Vec::new(),
            max_items: None,
            nested: None,
            description: "",
            validator: None,
            normalizer: None,
        }
    }

    pub fn string() -> Self {
        Self::of(AttrType::String, AttrType::String)
    }

    pub fn int() -> Self {
        Self::of(AttrType::Int, AttrType::Int)
    }

    pub fn float() -> Self {
        Self::of(AttrType::Float, AttrType::Float)
    }

    pub fn bool() -> Self {
        Self::of(AttrType::Bool, AttrType::Bool)
    }

    pub fn string_set() -> Self {
        Self::of(AttrType::Set, AttrType::String)
    }

    pub fn string_list() -> Self {
        Self::of(AttrType::List, AttrType::String)
    }

    pub fn string_map() -> Self {
        Self::of(AttrType::Map, AttrType::String)
    }

    /// A single nested block, stored as a one-element list of maps.
    pub fn block(schema: Schema) -> Self {
        let mut attr = Self::of(AttrType::List, AttrType::Map);
        attr.nested = Some(schema);
        attr.max_items = Some(1);
        attr
    }

    /// An unordered collection of nested blocks.
    pub fn block_set(schema: Schema) -> Self {
        let mut attr = Self::of(AttrType::Set, AttrType::Map);
        attr.nested = Some(schema);
        attr
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn conflicts_with(mut self, keys: &[&'static str]) -> Self {
        self.conflicts_with.extend_from_slice(keys);
        self
    }

    pub fn max_items(mut self, n: usize) -> Self {
        self.max_items = Some(n);
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn validate_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(f));
        self
    }

    pub fn normalize_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.normalizer = Some(Arc::new(f));
        self
    }

    /// Computed and never configured by the user.
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }

    /// The value used for comparisons.
    pub fn normalized(&self, value: &Value) -> Value {
        let value = self.coerce(value.clone());
        if value.is_null() {
            return Value::Null;
        }
        match &self.normalizer {
            Some(f) => f(&value),
            None => value,
        }
    }

    /// Shape `value` to this attribute's type: lists declared as sets become
    /// sets, integral floats become ints, nested blocks are coerced recursively
    /// and get their defaults.
    pub fn coerce(&self, value: Value) -> Value {
        let value = match (self.ty, value) {
            (AttrType::Int, Value::Float(f)) if f.fract() == 0.0 => Value::Int(f as i64),
            (AttrType::Float, Value::Int(i)) => Value::Float(i as f64),
            (AttrType::Set, Value::List(items)) => Value::set(items),
            (AttrType::List, Value::Set(items)) => Value::List(items),
            (_, v) => v,
        };
        let Some(nested) = &self.nested else {
            return value;
        };
        let coerce_items = |items: Vec<Value>| -> Vec<Value> {
            items
                .into_iter()
                .map(|item| match item {
                    Value::Map(m) => {
                        let mut m = nested.coerce(m);
                        nested.apply_defaults(&mut m);
                        Value::Map(m)
                    }
                    other => other,
                })
                .collect()
        };
        match value {
            Value::List(items) => Value::List(coerce_items(items)),
            Value::Set(items) => Value::set(coerce_items(items)),
            other => other,
        }
    }

    fn type_matches(&self, value: &Value) -> bool {
        match (self.ty, value) {
            (_, Value::Null) => true,
            (AttrType::Bool, Value::Bool(_)) => true,
            (AttrType::Int, v) => v.as_int().is_some(),
            (AttrType::Float, v) => v.as_float().is_some(),
            (AttrType::String, Value::String(_)) => true,
            (AttrType::List | AttrType::Set, Value::List(_) | Value::Set(_)) => true,
            (AttrType::Map, Value::Map(_)) => true,
            _ => false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Schema {
    pub version: u32,
    attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn attr(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.insert(name.to_string(), attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Attribute)> {
        self.attributes.iter()
    }

    /// Coerce every known attribute of `attrs` to its declared shape.
    /// Unknown keys are dropped.
    pub fn coerce(&self, attrs: BTreeMap<String, Value>) -> BTreeMap<String, Value> {
        attrs
            .into_iter()
            .filter_map(|(k, v)| self.get(&k).map(|a| (k, a.coerce(v))))
            .collect()
    }

    /// Fill unset attributes that declare a default.
    pub fn apply_defaults(&self, attrs: &mut BTreeMap<String, Value>) {
        for (name, attr) in &self.attributes {
            if let Some(default) = &attr.default {
                let unset = attrs.get(name).map(Value::is_null).unwrap_or(true);
                if unset {
                    attrs.insert(name.clone(), default.clone());
                }
            }
        }
    }

    /// Plan-time validation of configured attributes.
    pub fn validate(&self, attrs: &BTreeMap<String, Value>) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        self.validate_into("", attrs, &mut diags);
        diags
    }

    fn validate_into(&self, prefix: &str, attrs: &BTreeMap<String, Value>, diags: &mut Vec<Diagnostic>) {
        for key in attrs.keys() {
            if !self.contains(key) {
                diags.push(Diagnostic::error(
                    format!("{}{}", prefix, key),
                    "unsupported attribute",
                ));
            }
        }

        for (name, attr) in &self.attributes {
            let path = format!("{}{}", prefix, name);
            let value = attrs.get(name).cloned().unwrap_or_default();

            if value.is_null() {
                if attr.required {
                    diags.push(Diagnostic::error(path, "attribute is required"));
                }
                continue;
            }

            if attr.is_computed_only() {
                continue;
            }

            if !attr.type_matches(&value) {
                diags.push(Diagnostic::error(
                    path,
                    format!("expected {:?}, got {}", attr.ty, value.type_name()),
                ));
                continue;
            }

            for other in &attr.conflicts_with {
                let set = attrs.get(*other).map(|v| !v.is_null()).unwrap_or(false);
                if set {
                    diags.push(Diagnostic::error(
                        path.clone(),
                        format!("conflicts with {}{}", prefix, other),
                    ));
                }
            }

            if let (Some(max), Some(items)) = (attr.max_items, value.as_list()) {
                if items.len() > max {
                    diags.push(Diagnostic::error(
                        path.clone(),
                        format!("at most {} item(s) allowed, got {}", max, items.len()),
                    ));
                }
            }

            if let Some(validator) = &attr.validator {
                match &value {
                    Value::List(items) | Value::Set(items) if attr.nested.is_none() => {
                        for (i, item) in items.iter().enumerate() {
                            if let Err(msg) = validator(item) {
                                diags.push(Diagnostic::error(format!("{}.{}", path, i), msg));
                            }
                        }
                    }
                    Value::Map(m) if attr.ty == AttrType::Map => {
                        for (k, item) in m {
                            if let Err(msg) = validator(item) {
                                diags.push(Diagnostic::error(format!("{}.{}", path, k), msg));
                            }
                        }
                    }
                    v => {
                        if let Err(msg) = validator(v) {
                            diags.push(Diagnostic::error(path.clone(), msg));
                        }
                    }
                }
            }

            if let (Some(nested), Some(items)) = (&attr.nested, value.as_list()) {
                for (i, item) in items.iter().enumerate() {
                    match item.as_map() {
                        Some(block) => {
                            nested.validate_into(&format!("{}.{}.", path, i), block, diags)
                        }
                        None => diags.push(Diagnostic::error(
                            format!("{}.{}", path, i),
                            "expected a block",
                        )),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        Schema::new()
            .version(1)
            .attr("zone", Attribute::string().required().force_new())
            .attr("size", Attribute::int().optional().default(10_i64))
            .attr("tags", Attribute::string_set().optional())
            .attr("cidr", Attribute::string().optional().conflicts_with(&["source"]))
            .attr("source", Attribute::string().optional())
            .attr("id_out", Attribute::string().computed())
            .attr(
                "check",
                Attribute::block(
                    Schema::new()
                        .attr("port", Attribute::int().required())
                        .attr("mode", Attribute::string().optional().default("tcp")),
                )
                .optional(),
            )
    }

    fn attrs(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_coerce_turns_lists_into_sets() {
        let coerced = sample().coerce(attrs(&[
            ("tags", Value::string_list(["b", "a", "b"])),
            ("unknown", Value::Int(1)),
        ]));
        assert_eq!(coerced["tags"], Value::string_set(["a", "b"]));
        assert!(!coerced.contains_key("unknown"));
    }

    #[test]
    fn test_apply_defaults_only_fills_unset() {
        let schema = sample();
        let mut a = attrs(&[("size", Value::Null)]);
        schema.apply_defaults(&mut a);
        assert_eq!(a["size"], Value::Int(10));

        let mut b = attrs(&[("size", Value::Int(50))]);
        schema.apply_defaults(&mut b);
        assert_eq!(b["size"], Value::Int(50));
    }

    #[test]
    fn test_validate_required_and_types() {
        let diags = sample().validate(&attrs(&[("size", Value::from("big"))]));
        let paths: Vec<_> = diags.iter().filter_map(|d| d.attribute.clone()).collect();
        assert!(paths.contains(&"zone".to_string()));
        assert!(paths.contains(&"size".to_string()));
    }

    #[test]
    fn test_validate_conflicts_and_nested() {
        let mut block = BTreeMap::new();
        block.insert("mode".to_string(), Value::from("http"));
        let diags = sample().validate(&attrs(&[
            ("zone", Value::from("ch-gva-2")),
            ("cidr", Value::from("0.0.0.0/0")),
            ("source", Value::from("sg-1")),
            ("check", Value::List(vec![Value::Map(block)])),
        ]));
        let paths: Vec<_> = diags.iter().filter_map(|d| d.attribute.clone()).collect();
        assert!(paths.contains(&"cidr".to_string()));
        assert!(paths.contains(&"check.0.port".to_string()));
    }

    #[test]
    fn test_validate_max_items() {
        let block = Value::Map(attrs(&[("port", Value::Int(80))]));
        let diags = sample().validate(&attrs(&[
            ("zone", Value::from("ch-gva-2")),
            ("check", Value::List(vec![block.clone(), block])),
        ]));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].detail.contains("at most 1"));
    }

    #[test]
    fn test_coerce_fills_block_defaults() {
        let block = Value::Map(attrs(&[("port", Value::Int(80))]));
        let coerced = sample().coerce(attrs(&[("check", Value::List(vec![block]))]));
        let check = coerced["check"].as_list().unwrap()[0].as_map().unwrap();
        assert_eq!(check["mode"], Value::from("tcp"));
        assert_eq!(check["port"], Value::Int(80));
    }

    #[test]
    fn test_normalizer_applies_on_compare() {
        let attr = Attribute::string()
            .optional()
            .normalize_with(|v| Value::from(v.as_str().unwrap_or_default().to_lowercase()));
        assert_eq!(attr.normalized(&Value::from("ABC")), attr.normalized(&Value::from("abc")));
        assert_eq!(attr.normalized(&Value::Null), Value::Null);
    }
}
