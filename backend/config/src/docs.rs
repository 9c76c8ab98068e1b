//! Config documentation generation and schema parity checks.
//!
//! The documentation source is a YAML map of named components. The `root`
//! component describes the top-level config; any node may `use` another
//! component to pull in its subtree, overriding fields and inserting extra
//! children with `after`. Rendering walks that tree in lock-step with the
//! schema descriptor and fails on any field one side has and the other lacks.

use crate::schema::{Describe, FieldKind, ObjectSchema};
use crate::v2_2;
use crate::version::Version;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::path::PathBuf;
use thiserror::Error;

/// Documentation source for the current schema.
pub const CONFIG_DOCS_YAML: &str = include_str!("../docs/config.yaml");

pub const ROOT_COMPONENT: &str = "root";

#[derive(Debug, Error)]
pub enum DocsError {
    #[error("parsing documentation components: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("missing component {0:?}")]
    MissingComponent(String),
    #[error("field {field:?}: no such component {component:?}")]
    UnknownComponent { field: String, component: String },
    #[error("component {0:?} cannot itself refer to a component")]
    NestedComponent(String),
    #[error("field {field:?}: override {child:?} not found; did you mean to set `after`?")]
    UnusedOverride { field: String, child: String },
    #[error("field {field:?}: `after` target {after:?} of {child:?} not found")]
    MissingAfter {
        field: String,
        child: String,
        after: String,
    },
    #[error("field {field:?}: override {child:?} sets `after` and also matches an existing field")]
    AfterOnOverride { field: String, child: String },
    #[error("field {field:?}: stray `after` parameter {after:?}")]
    StrayAfter { field: String, after: String },
    #[error("documented field {0} does not exist in the schema")]
    UnknownField(String),
    #[error("undocumented field {0}")]
    Undocumented(String),
    #[error("field {field}: invalid version bound {value:?}")]
    BadVersion { field: String, value: String },
    #[error("field {field}: compiling {regex:?}: {message}")]
    BadRegex {
        field: String,
        regex: String,
        message: String,
    },
    #[error("field {field}: applying {regex:?}: transform didn't change anything")]
    NoOpTransform { field: String, regex: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config docs out of date: {0}")]
    Drift(PathBuf),
}

/// One documented field, or a component.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: String,
    /// Unset, explicitly required, or explicitly optional.
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub transforms: Vec<Transform>,
    #[serde(default)]
    pub children: Vec<DocNode>,
    #[serde(default, rename = "use")]
    pub component: Option<String>,
    /// When overriding a component, insert this child after the named
    /// sibling (`^` for first, `$` for last).
    #[serde(default)]
    pub after: Option<String>,
}

/// A version-gated regex substitution on a description.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Transform {
    pub regex: String,
    #[serde(default)]
    pub replacement: String,
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
    /// Also applies to every descendant, where it may match nothing.
    #[serde(default)]
    pub descendants: bool,
}

pub type Components = BTreeMap<String, DocNode>;

pub fn parse_components(yaml: &str) -> Result<Components, DocsError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Render the Markdown reference for `version` of the current schema.
pub fn config_docs_markdown(version: Version) -> Result<String, DocsError> {
    let components = parse_components(CONFIG_DOCS_YAML)?;
    let body = render(version, &v2_2::Config::describe(), &components)?;
    let intro = components
        .get(ROOT_COMPONENT)
        .map(|root| root.desc.as_str())
        .unwrap_or_default();
    let mut out = String::new();
    let _ = writeln!(out, "# Configuration specification v{version}\n");
    if !intro.is_empty() {
        let _ = writeln!(out, "{intro}\n");
    }
    out.push_str("Fields in _italics_ are optional.\n\n");
    out.push_str(&body);
    Ok(out)
}

/// Render nested bullet docs for `schema`, driven by the `root` component.
pub fn render(version: Version, schema: &ObjectSchema, components: &Components) -> Result<String, DocsError> {
    let root = resolve_root(components)?;
    let mut out = String::new();
    let ancestors = vec![&root];
    render_object(&mut out, version, &root, schema, &ancestors, "", 0)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Component resolution
// ---------------------------------------------------------------------------

fn resolve_root(components: &Components) -> Result<DocNode, DocsError> {
    let mut root = components
        .get(ROOT_COMPONENT)
        .cloned()
        .ok_or_else(|| DocsError::MissingComponent(ROOT_COMPONENT.to_string()))?;
    resolve(&mut root, components)?;
    Ok(root)
}

fn resolve(node: &mut DocNode, components: &Components) -> Result<(), DocsError> {
    if let Some(name) = node.component.clone() {
        let component = components.get(&name).ok_or_else(|| DocsError::UnknownComponent {
            field: node.name.clone(),
            component: name.clone(),
        })?;
        if component.component.is_some() {
            return Err(DocsError::NestedComponent(name));
        }
        let mut merged = component.clone();
        merge(&mut merged, std::mem::take(node))?;
        merged.component = None;
        *node = merged;
    }
    if let Some(after) = &node.after {
        return Err(DocsError::StrayAfter {
            field: node.name.clone(),
            after: after.clone(),
        });
    }
    for child in &mut node.children {
        resolve(child, components)?;
    }
    Ok(())
}

/// Apply `over` on top of `base`: set fields win, transforms append, and
/// children either override a same-named child or are inserted via `after`.
fn merge(base: &mut DocNode, over: DocNode) -> Result<(), DocsError> {
    if !over.name.is_empty() {
        base.name = over.name;
    }
    if !over.desc.is_empty() {
        base.desc = over.desc;
    }
    if over.required.is_some() {
        base.required = over.required;
    }
    base.transforms.extend(over.transforms);
    if over.component.is_some() {
        base.component = over.component;
    }
    if over.after.is_some() {
        base.after = over.after;
    }

    let mut overrides: HashMap<String, DocNode> = HashMap::new();
    let mut insertions: HashMap<String, Vec<DocNode>> = HashMap::new();
    let mut order = Vec::new();
    for child in over.children {
        order.push(child.name.clone());
        match child.after.clone() {
            Some(after) => insertions.entry(after).or_default().push(child),
            None => {
                overrides.insert(child.name.clone(), child);
            }
        }
    }

    let field = base.name.clone();
    if let Some(clash) = insertions
        .values()
        .flatten()
        .find(|inserted| base.children.iter().any(|c| c.name == inserted.name))
    {
        return Err(DocsError::AfterOnOverride {
            field,
            child: clash.name.clone(),
        });
    }

    let mut children = Vec::new();
    insert_after("^", &mut insertions, &mut children);
    for mut child in std::mem::take(&mut base.children) {
        let name = child.name.clone();
        if let Some(over) = overrides.remove(&name) {
            merge(&mut child, over)?;
        }
        children.push(child);
        insert_after(&name, &mut insertions, &mut children);
    }
    insert_after("$", &mut insertions, &mut children);
    base.children = children;

    // report leftovers in the order they were written
    for name in order {
        if overrides.contains_key(&name) {
            return Err(DocsError::UnusedOverride { field, child: name });
        }
        if let Some(child) = insertions.values().flatten().find(|c| c.name == name) {
            return Err(DocsError::MissingAfter {
                field,
                child: name,
                after: child.after.clone().unwrap_or_default(),
            });
        }
    }
    Ok(())
}

fn insert_after(anchor: &str, pending: &mut HashMap<String, Vec<DocNode>>, children: &mut Vec<DocNode>) {
    for mut child in pending.remove(anchor).unwrap_or_default() {
        child.after = None;
        children.push(child);
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_object(
    out: &mut String,
    version: Version,
    node: &DocNode,
    schema: &ObjectSchema,
    ancestors: &[&DocNode],
    prefix: &str,
    level: usize,
) -> Result<(), DocsError> {
    for field in &schema.fields {
        if !node.children.iter().any(|c| c.name == field.name) {
            return Err(DocsError::Undocumented(qualified(prefix, field.name)));
        }
    }

    for child in &node.children {
        let path = qualified(prefix, &child.name);
        let field = schema
            .get(&child.name)
            .ok_or_else(|| DocsError::UnknownField(path.clone()))?;

        let marker = if is_optional(child, &field.kind) { "_" } else { "" };
        let desc = render_description(version, child, ancestors, &path)?;
        let _ = writeln!(
            out,
            "{}* **{marker}{}{marker}** ({}): {desc}",
            "  ".repeat(level),
            child.name,
            field.kind.type_name(),
        );

        match field.kind.object_schema() {
            Some(nested) => {
                let mut lineage = ancestors.to_vec();
                lineage.push(child);
                render_object(out, version, child, &nested, &lineage, &path, level + 1)?;
            }
            None => {
                if let Some(extra) = child.children.first() {
                    return Err(DocsError::UnknownField(qualified(&path, &extra.name)));
                }
            }
        }
    }
    Ok(())
}

fn qualified(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Only explicitly required scalar fields render as required.
fn is_optional(node: &DocNode, kind: &FieldKind) -> bool {
    !(node.required == Some(true) && kind.is_scalar())
}

/// Substitute `%VERSION%`, then apply the node's own transforms followed by
/// the `descendants` transforms of each ancestor, nearest first.
fn render_description(
    version: Version,
    node: &DocNode,
    ancestors: &[&DocNode],
    path: &str,
) -> Result<String, DocsError> {
    let inherited = ancestors
        .iter()
        .rev()
        .flat_map(|a| a.transforms.iter())
        .filter(|t| t.descendants);

    let mut desc = node.desc.replace("%VERSION%", &version.to_string());
    for transform in node.transforms.iter().chain(inherited) {
        if !in_bounds(version, transform, path)? {
            continue;
        }
        let re = Regex::new(&transform.regex).map_err(|e| DocsError::BadRegex {
            field: path.to_string(),
            regex: transform.regex.clone(),
            message: e.to_string(),
        })?;
        let replaced = re.replace_all(&desc, transform.replacement.as_str()).into_owned();
        if replaced == desc && !transform.descendants {
            return Err(DocsError::NoOpTransform {
                field: path.to_string(),
                regex: transform.regex.clone(),
            });
        }
        desc = replaced;
    }
    Ok(desc)
}

fn in_bounds(version: Version, transform: &Transform, path: &str) -> Result<bool, DocsError> {
    let parse = |bound: &str| -> Result<Version, DocsError> {
        bound.parse().map_err(|_| DocsError::BadVersion {
            field: path.to_string(),
            value: bound.to_string(),
        })
    };
    if let Some(min) = &transform.min {
        if version < parse(min)? {
            return Ok(false);
        }
    }
    if let Some(max) = &transform.max {
        if version > parse(max)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::{MAX_VERSION, V2_0, V2_1};

    struct Leaf;
    impl Describe for Leaf {
        fn describe() -> ObjectSchema {
            ObjectSchema::new("Leaf")
                .field("name", FieldKind::String)
                .field("size", FieldKind::optional(FieldKind::Integer))
        }
    }

    struct Top;
    impl Describe for Top {
        fn describe() -> ObjectSchema {
            ObjectSchema::new("Top")
                .field("version", FieldKind::String)
                .field("leaves", FieldKind::list_of(FieldKind::object::<Leaf>()))
        }
    }

    const DOCS: &str = r#"
root:
  children:
    - name: version
      desc: "must be %VERSION%"
      required: true
    - name: leaves
      desc: the leaves
      required: true
      children:
        - name: size
          desc: size in bytes
        - name: name
          desc: the leaf name
          required: true
"#;

    fn components(yaml: &str) -> Components {
        parse_components(yaml).unwrap()
    }

    #[test]
    fn renders_in_documentation_order() {
        let out = render(V2_1, &Top::describe(), &components(DOCS)).unwrap();
        assert_eq!(
            out,
            "* **version** (string): must be 2.1.0\n\
             * **_leaves_** (list of objects): the leaves\n\
             \x20 * **_size_** (integer): size in bytes\n\
             \x20 * **name** (string): the leaf name\n"
        );
    }

    #[test]
    fn undocumented_schema_field_fails() {
        let yaml = DOCS.replace("        - name: size\n          desc: size in bytes\n", "");
        let err = render(V2_1, &Top::describe(), &components(&yaml)).unwrap_err();
        assert!(matches!(err, DocsError::Undocumented(ref f) if f == "leaves.size"), "{err}");
    }

    #[test]
    fn documented_field_missing_from_schema_fails() {
        let yaml = format!("{DOCS}    - name: removed\n      desc: gone\n");
        let err = render(V2_1, &Top::describe(), &components(&yaml)).unwrap_err();
        assert!(matches!(err, DocsError::UnknownField(ref f) if f == "removed"), "{err}");
    }

    #[test]
    fn version_gated_transforms() {
        let yaml = r#"
root:
  children:
    - name: version
      desc: "supported since 2.0"
      transforms:
        - regex: "2\\.0"
          replacement: "2.1"
          min: 2.1.0
"#;
        let schema = ObjectSchema::new("V").field("version", FieldKind::String);
        let c = components(yaml);
        assert_eq!(render(V2_0, &schema, &c).unwrap(), "* **_version_** (string): supported since 2.0\n");
        assert_eq!(render(V2_1, &schema, &c).unwrap(), "* **_version_** (string): supported since 2.1\n");
    }

    #[test]
    fn no_op_transform_fails() {
        let yaml = r#"
root:
  children:
    - name: version
      desc: "plain"
      transforms:
        - regex: "absent"
          replacement: "x"
"#;
        let schema = ObjectSchema::new("V").field("version", FieldKind::String);
        let err = render(V2_1, &schema, &components(yaml)).unwrap_err();
        assert!(matches!(err, DocsError::NoOpTransform { .. }), "{err}");
    }

    #[test]
    fn descendant_transforms_apply_below_and_may_miss() {
        let yaml = r#"
root:
  children:
    - name: leaves
      desc: "leaf list"
      transforms:
        - regex: "leaf"
          replacement: "node"
          descendants: true
      children:
        - name: name
          desc: "leaf name"
        - name: size
          desc: "bytes"
    - name: version
      desc: "v"
"#;
        let out = render(V2_1, &Top::describe(), &components(yaml)).unwrap();
        assert!(out.contains("(list of objects): node list"));
        assert!(out.contains("(string): node name"));
        assert!(out.contains("(integer): bytes"));
    }

    #[test]
    fn components_are_spliced_with_overrides_and_insertions() {
        let yaml = r#"
leaf:
  desc: "a leaf"
  children:
    - name: name
      desc: "leaf name"
root:
  children:
    - name: version
      desc: "v"
    - name: leaves
      use: leaf
      children:
        - name: name
          required: true
        - name: size
          desc: "inserted"
          after: name
"#;
        let out = render(V2_1, &Top::describe(), &components(yaml)).unwrap();
        assert_eq!(
            out,
            "* **_version_** (string): v\n\
             * **_leaves_** (list of objects): a leaf\n\
             \x20 * **name** (string): leaf name\n\
             \x20 * **_size_** (integer): inserted\n"
        );
    }

    #[test]
    fn inserted_child_may_not_duplicate_a_component_child() {
        for anchor in ["^", "name", "$"] {
            let yaml = format!(
                r#"
leaf:
  children:
    - name: name
      desc: "leaf name"
    - name: size
      desc: "bytes"
root:
  children:
    - name: version
      desc: "v"
    - name: leaves
      use: leaf
      children:
        - name: name
          desc: "dup"
          after: "{anchor}"
"#
            );
            let err = render(V2_1, &Top::describe(), &components(&yaml)).unwrap_err();
            assert!(
                matches!(err, DocsError::AfterOnOverride { ref child, .. } if child == "name"),
                "{anchor}: {err}"
            );
        }
    }

    #[test]
    fn component_errors() {
        let nested = "a:\n  use: b\nb:\n  desc: x\nroot:\n  children:\n    - name: version\n      use: a\n";
        let schema = ObjectSchema::new("V").field("version", FieldKind::String);
        assert!(matches!(
            render(V2_1, &schema, &components(nested)),
            Err(DocsError::NestedComponent(_))
        ));

        let missing = "root:\n  children:\n    - name: version\n      use: nope\n";
        assert!(matches!(
            render(V2_1, &schema, &components(missing)),
            Err(DocsError::UnknownComponent { .. })
        ));

        assert!(matches!(
            render(V2_1, &schema, &components("other: {}\n")),
            Err(DocsError::MissingComponent(_))
        ));

        let stray = "root:\n  children:\n    - name: version\n      after: x\n";
        assert!(matches!(
            render(V2_1, &schema, &components(stray)),
            Err(DocsError::StrayAfter { .. })
        ));
    }

    #[test]
    fn unknown_yaml_keys_are_rejected() {
        assert!(matches!(
            parse_components("root:\n  descr: typo\n"),
            Err(DocsError::Yaml(_))
        ));
    }

    #[test]
    fn embedded_docs_cover_the_current_schema() {
        let out = config_docs_markdown(MAX_VERSION).unwrap();
        assert!(out.starts_with("# Configuration specification v2.2.0\n"));
        assert!(out.contains("* **_ignition_** (object): metadata"));
        assert!(out.contains("* **version** (string):"));
        assert!(out.contains("(list of objects)"));
    }

    #[test]
    fn embedded_docs_render_for_older_versions() {
        for version in [V2_0, V2_1] {
            config_docs_markdown(version).unwrap();
        }
    }
}
