//! Serializer classes.

use std::collections::{BTreeMap, BTreeSet};

use extra_checks_syntax::{ClassDef, Expr};

use super::django;
use super::resolve::{ClassIndex, ClassInfo};
use crate::source::ClassLocation;

const MAX_INHERITANCE_DEPTH: usize = 32;

/// A serializer class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializerClass {
    /// Dotted class path.
    pub path: String,
    /// Class name.
    pub name: String,
    /// Declaring module.
    pub module: String,
    /// Declaring file.
    pub file: std::path::PathBuf,
    /// Source location; `None` for dynamic classes.
    pub location: Option<ClassLocation>,
    /// Whether `ModelSerializer` is an ancestor.
    pub model_bound: bool,
    /// Whether the class or an ancestor defines `Meta`.
    pub has_meta: bool,
    /// Serializer fields declared on the class or inherited.
    pub declared_fields: BTreeSet<String>,
    /// Names assigned in the effective `Meta`.
    pub meta_names: BTreeSet<String>,
    /// Literal keys of `Meta.extra_kwargs`.
    pub extra_kwargs: BTreeSet<String>,
}

impl SerializerClass {
    /// Whether the effective `Meta` defines `name`.
    #[must_use]
    pub fn meta_has(&self, name: &str) -> bool {
        self.meta_names.contains(name)
    }
}

pub(crate) struct SerializerBuilder<'a> {
    index: &'a ClassIndex,
}

impl<'a> SerializerBuilder<'a> {
    pub(crate) fn new(index: &'a ClassIndex) -> Self {
        Self { index }
    }

    /// Plain serializers and model-bound serializers, each deduplicated.
    pub(crate) fn partition(&self) -> (Vec<&'a ClassInfo>, Vec<&'a ClassInfo>) {
        self.index
            .collect_subclasses(&[django::SERIALIZER])
            .into_iter()
            .partition(|c| !self.index.is_subclass(&c.path, django::MODEL_SERIALIZER))
    }

    pub(crate) fn build(&self, info: &'a ClassInfo) -> SerializerClass {
        let meta = self.effective_meta(info);
        let attrs = meta
            .map(|(owner, def)| self.meta_attrs(owner, def, 0))
            .unwrap_or_default();
        let extra_kwargs = match attrs.get("extra_kwargs") {
            Some(Some(Expr::Dict(items))) => items
                .iter()
                .filter_map(|(k, _)| k.as_str().map(String::from))
                .collect(),
            _ => BTreeSet::new(),
        };
        let meta_names = attrs.into_keys().collect();
        SerializerClass {
            path: info.path.clone(),
            name: info.name().to_owned(),
            module: info.module.clone(),
            file: info.file.clone(),
            location: info.location(),
            model_bound: self.index.is_subclass(&info.path, django::MODEL_SERIALIZER),
            has_meta: meta.is_some(),
            declared_fields: self.declared_fields(info),
            meta_names,
            extra_kwargs,
        }
    }

    /// Nearest `Meta` in the class chain, with its owner.
    fn effective_meta(&self, info: &'a ClassInfo) -> Option<(&'a ClassInfo, &'a ClassDef)> {
        if let Some(meta) = info.def.nested_class("Meta") {
            return Some((info, meta));
        }
        self.index
            .ancestors(&info.path)
            .iter()
            .filter_map(|a| self.index.class(a))
            .find_map(|c| c.def.nested_class("Meta").map(|m| (c, m)))
    }

    /// Attributes of `meta`, inherited ones from `class Meta(Parent.Meta)`
    /// included. Own assignments win.
    fn meta_attrs(
        &self,
        owner: &'a ClassInfo,
        meta: &'a ClassDef,
        depth: usize,
    ) -> BTreeMap<String, Option<&'a Expr>> {
        let mut attrs = BTreeMap::new();
        if depth <= MAX_INHERITANCE_DEPTH {
            for base in meta.bases.iter().filter_map(Expr::dotted) {
                let Some(parent_owner) = base.strip_suffix(".Meta") else {
                    continue;
                };
                let path = self.index.resolve(&owner.module, parent_owner);
                if let Some((owner, parent_meta)) =
                    self.index.class(&path).and_then(|p| self.effective_meta(p))
                {
                    attrs.extend(self.meta_attrs(owner, parent_meta, depth + 1));
                }
            }
        }
        for assign in meta.assignments() {
            for target in &assign.targets {
                attrs.insert(target.clone(), assign.value.as_ref());
            }
        }
        attrs
    }

    fn declared_fields(&self, info: &ClassInfo) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        let mut chain: Vec<String> = self.index.ancestors(&info.path);
        chain.reverse();
        chain.push(info.path.clone());
        for path in chain {
            let Some(class) = self.index.class(&path) else { continue };
            for assign in class.def.assignments() {
                let is_field = assign
                    .value
                    .as_ref()
                    .and_then(Expr::as_call)
                    .and_then(|c| c.func_name())
                    .is_some_and(|func| self.is_serializer_field(&class.module, func));
                for target in &assign.targets {
                    if is_field {
                        fields.insert(target.clone());
                    } else {
                        // A plain attribute hides an inherited field.
                        fields.remove(target);
                    }
                }
            }
        }
        fields
    }

    fn is_serializer_field(&self, module: &str, func: &str) -> bool {
        let path = self.index.resolve(module, func);
        if path.starts_with("rest_framework.") {
            return true;
        }
        self.index.class(&path).is_some()
            && self
                .index
                .ancestors(&path)
                .iter()
                .any(|a| a.starts_with("rest_framework."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::resolve::SourceFile;

    const SOURCE: &str = r#"
from rest_framework import serializers


class Base(serializers.ModelSerializer):
    title = serializers.CharField()
    rank = serializers.IntegerField()

    class Meta:
        fields = "__all__"
        extra_kwargs = {"title": {"required": False}, "slug": {}}


class Child(Base):
    rank = None

    class Meta(Base.Meta):
        model = Post


class Inherits(Child):
    pass


class Plain(serializers.Serializer):
    name = serializers.CharField()
"#;

    fn index() -> ClassIndex {
        ClassIndex::build(&[SourceFile {
            path: "api/serializers.py".into(),
            module: "api.serializers".into(),
            is_package: false,
            is_site: false,
            ast: extra_checks_syntax::parse(SOURCE).unwrap(),
        }])
    }

    #[test]
    fn partition_by_model_binding() {
        let index = index();
        let builder = SerializerBuilder::new(&index);
        let (plain, bound) = builder.partition();
        assert_eq!(plain.iter().map(|c| c.name()).collect::<Vec<_>>(), vec!["Plain"]);
        assert_eq!(
            bound.iter().map(|c| c.name()).collect::<Vec<_>>(),
            vec!["Base", "Child", "Inherits"]
        );
    }

    #[test]
    fn meta_and_fields_follow_inheritance() {
        let index = index();
        let builder = SerializerBuilder::new(&index);
        let base = builder.build(index.class("api.serializers.Base").unwrap());
        assert_eq!(base.extra_kwargs, BTreeSet::from(["slug".into(), "title".into()]));
        assert_eq!(base.declared_fields, BTreeSet::from(["rank".into(), "title".into()]));

        let child = builder.build(index.class("api.serializers.Child").unwrap());
        assert!(child.meta_has("fields"));
        assert!(child.meta_has("model"));
        assert_eq!(child.extra_kwargs, base.extra_kwargs);
        assert_eq!(child.declared_fields, BTreeSet::from(["title".into()]));

        let inherits = builder.build(index.class("api.serializers.Inherits").unwrap());
        assert!(inherits.has_meta);
        assert!(inherits.meta_has("model"));
        assert!(inherits.model_bound);
    }
}
