//! Models, their `Meta` options and fields, read from class declarations.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use extra_checks_syntax::{Call, ClassDef, Expr};

use super::django;
use super::resolve::{ClassIndex, ClassInfo};
use crate::source::ClassLocation;

/// Attributes every model class has.
const MODEL_ATTRIBUTES: &[&str] = &[
    "pk",
    "_meta",
    "_state",
    "DoesNotExist",
    "MultipleObjectsReturned",
    "__init__",
    "__str__",
    "__repr__",
    "__eq__",
    "__hash__",
    "save",
    "save_base",
    "delete",
    "clean",
    "clean_fields",
    "full_clean",
    "validate_unique",
    "validate_constraints",
    "refresh_from_db",
    "get_deferred_fields",
    "serializable_value",
    "from_db",
    "check",
];

/// Field classes whose instances never store the empty string.
const NO_EMPTY_STRINGS: &[&str] = &[
    "IntegerField",
    "BigIntegerField",
    "SmallIntegerField",
    "BooleanField",
    "DateField",
    "TimeField",
    "DurationField",
    "DecimalField",
    "FloatField",
    "UUIDField",
    "JSONField",
    "GenericIPAddressField",
    "ForeignObject",
];

const MAX_INHERITANCE_DEPTH: usize = 32;

/// A literal choice value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChoiceValue {
    /// `None`
    None,
    /// `True` / `False`
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Float literal as written.
    Float(String),
    /// String literal.
    Str(String),
}

impl ChoiceValue {
    /// Converts a literal expression.
    #[must_use]
    pub fn from_expr(expr: &Expr) -> Option<Self> {
        match expr {
            Expr::None => Some(Self::None),
            Expr::Bool(b) => Some(Self::Bool(*b)),
            Expr::Int(i) => Some(Self::Int(*i)),
            Expr::Float(f) => Some(Self::Float(f.clone())),
            Expr::Str(s) => Some(Self::Str(s.clone())),
            _ => None,
        }
    }

    /// Python-like rendering: strings are double-quoted.
    #[must_use]
    pub fn repr(&self) -> String {
        match self {
            Self::Str(s) => format!("\"{s}\""),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ChoiceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) | Self::Str(v) => f.write_str(v),
        }
    }
}

/// The `default=` argument of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldDefault {
    /// Not passed.
    #[default]
    Missing,
    /// `default=None`.
    None,
    /// Anything else.
    Value,
}

/// A model field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Attribute name.
    pub name: String,
    /// Canonical class path.
    pub class_path: String,
    /// The class path followed by its ancestors.
    pub ancestry: Vec<String>,
    /// Path of the class whose body declares the field.
    pub declared_in: String,
    /// Created by the framework rather than declared.
    pub auto_created: bool,
    /// `null`; `None` when the argument is not a literal.
    pub null: Option<bool>,
    /// `blank=True` was passed.
    pub blank: bool,
    /// `primary_key=True` was passed.
    pub primary_key: bool,
    /// An `upload_to` value that is not statically empty was passed.
    pub upload_to: bool,
    /// `related_name`; non-literal values keep their source text.
    pub related_name: Option<String>,
    /// `default`.
    pub default: FieldDefault,
    /// Flattened choice values; `None` without choices or when they
    /// cannot be resolved statically.
    pub choices: Option<Vec<ChoiceValue>>,
}

impl Field {
    fn auto_id(declared_in: &str) -> Self {
        let class_path = django::model_class("AutoField");
        let mut ancestry = vec![class_path.clone()];
        ancestry.extend(django::ancestors(&class_path));
        Self {
            name: "id".to_owned(),
            class_path,
            ancestry,
            declared_in: declared_in.to_owned(),
            auto_created: true,
            null: Some(false),
            blank: true,
            primary_key: true,
            upload_to: false,
            related_name: None,
            default: FieldDefault::Missing,
            choices: None,
        }
    }

    /// Whether the field is an instance of `class`. Bare names refer to
    /// `django.db.models`.
    #[must_use]
    pub fn is_instance(&self, class: &str) -> bool {
        if class.contains('.') {
            self.ancestry.iter().any(|a| a == class)
        } else {
            let path = django::model_class(class);
            self.ancestry.iter().any(|a| *a == path)
        }
    }

    /// Whether the field is a relation.
    #[must_use]
    pub fn is_related(&self) -> bool {
        self.is_instance("RelatedField")
    }

    /// Whether the field points to exactly one row of another model.
    #[must_use]
    pub fn many_to_one(&self) -> bool {
        self.is_instance("ForeignObject")
            && !self.is_instance("OneToOneField")
            && !self.is_instance("django.contrib.contenttypes.fields.GenericRelation")
    }

    /// Whether the empty string is a valid stored value.
    #[must_use]
    pub fn empty_strings_allowed(&self) -> bool {
        !NO_EMPTY_STRINGS.iter().any(|c| self.is_instance(c))
    }

    /// Whether `null` is statically `True`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.null == Some(true)
    }
}

/// A `CheckConstraint` with the `__in` lookups of its condition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckConstraint {
    /// Constraint name.
    pub name: Option<String>,
    /// `field__in` lookup to its literal values.
    pub in_lookups: BTreeMap<String, Vec<ChoiceValue>>,
}

/// Parsed `Meta` options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelMeta {
    /// `abstract = True`.
    pub is_abstract: bool,
    /// `proxy = True`.
    pub proxy: bool,
    /// Names assigned in `Meta`, inherited ones included.
    pub options: BTreeSet<String>,
    /// `app_label`.
    pub app_label: Option<String>,
    /// `db_table`.
    pub db_table: Option<String>,
    /// `unique_together` groups.
    pub unique_together: Vec<Vec<String>>,
    /// `index_together` groups.
    pub index_together: Vec<Vec<String>>,
    /// `fields` of each `Index`.
    pub indexes: Vec<Vec<String>>,
    /// `fields` of each `UniqueConstraint`.
    pub unique_constraints: Vec<Vec<String>>,
    /// Every `CheckConstraint`.
    pub check_constraints: Vec<CheckConstraint>,
}

impl ModelMeta {
    fn from_class(meta: &ClassDef, mut base: Self) -> Self {
        for assign in meta.assignments() {
            let Some(value) = &assign.value else { continue };
            for target in &assign.targets {
                base.options.insert(target.clone());
                match target.as_str() {
                    "abstract" => base.is_abstract = value.as_bool().unwrap_or(false),
                    "proxy" => base.proxy = value.as_bool().unwrap_or(false),
                    "app_label" => base.app_label = value.as_str().map(String::from),
                    "db_table" => base.db_table = value.as_str().map(String::from),
                    "unique_together" => base.unique_together = together(value),
                    "index_together" => base.index_together = together(value),
                    "indexes" => {
                        base.indexes = calls_named(value, "Index")
                            .filter_map(|c| c.keyword("fields").map(strings))
                            .collect();
                    }
                    "constraints" => {
                        base.unique_constraints = calls_named(value, "UniqueConstraint")
                            .filter_map(|c| c.keyword("fields").map(strings))
                            .collect();
                        base.check_constraints = calls_named(value, "CheckConstraint")
                            .map(check_constraint)
                            .collect();
                    }
                    _ => {}
                }
            }
        }
        base
    }

    /// Field names mentioned by any index or uniqueness declaration,
    /// ordering prefixes removed.
    #[must_use]
    pub fn index_field_names(&self) -> BTreeSet<String> {
        self.unique_together
            .iter()
            .chain(&self.index_together)
            .chain(&self.unique_constraints)
            .chain(&self.indexes)
            .flatten()
            .map(|name| name.trim_start_matches('-').to_owned())
            .collect()
    }
}

fn strings(expr: &Expr) -> Vec<String> {
    expr.elements()
        .map(|items| items.iter().filter_map(|e| e.as_str().map(String::from)).collect())
        .unwrap_or_default()
}

/// `("a", "b")` is one group; `(("a", "b"), ("c",))` are two.
fn together(expr: &Expr) -> Vec<Vec<String>> {
    let Some(items) = expr.elements() else {
        return Vec::new();
    };
    if !items.is_empty() && items.iter().all(|e| e.as_str().is_some()) {
        return vec![strings(expr)];
    }
    items.iter().map(strings).filter(|g| !g.is_empty()).collect()
}

fn calls_named<'e>(expr: &'e Expr, name: &'e str) -> impl Iterator<Item = &'e Call> {
    expr.elements()
        .unwrap_or_default()
        .iter()
        .filter_map(Expr::as_call)
        .filter(move |c| c.func.last_segment() == Some(name))
}

fn check_constraint(call: &Call) -> CheckConstraint {
    let condition = call
        .keyword("check")
        .or_else(|| call.keyword("condition"))
        .and_then(Expr::as_call)
        .filter(|q| q.func.last_segment() == Some("Q"));
    let in_lookups = condition
        .map(|q| {
            q.keywords
                .iter()
                .filter(|k| k.name.ends_with("__in"))
                .filter_map(|k| {
                    let values = k
                        .value
                        .elements()?
                        .iter()
                        .map(ChoiceValue::from_expr)
                        .collect::<Option<Vec<_>>>()?;
                    Some((k.name.clone(), values))
                })
                .collect()
        })
        .unwrap_or_default();
    CheckConstraint {
        name: call.keyword("name").and_then(Expr::as_str).map(String::from),
        in_lookups,
    }
}

/// A model class.
#[derive(Debug, Clone)]
pub struct ModelClass {
    /// Dotted class path.
    pub path: String,
    /// Class name.
    pub name: String,
    /// Declaring module.
    pub module: String,
    /// Application label.
    pub app_label: String,
    /// Owning application's dotted name.
    pub app: String,
    /// Source location; `None` for dynamic models.
    pub location: Option<ClassLocation>,
    /// `Meta` options.
    pub meta: ModelMeta,
    /// Local fields: own declarations, abstract parents' fields and the
    /// auto-created primary key.
    pub fields: Vec<Field>,
    attributes: BTreeSet<String>,
}

impl ModelClass {
    /// `app_label.ModelName`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}.{}", self.app_label, self.name)
    }

    /// Whether the class exposes attribute `name`.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    /// Looks a field up by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether the model has its own table.
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        !self.meta.is_abstract && !self.meta.proxy
    }
}

/// Builds [`ModelClass`] records from the class index.
pub(crate) struct ModelBuilder<'a> {
    index: &'a ClassIndex,
}

impl<'a> ModelBuilder<'a> {
    pub(crate) fn new(index: &'a ClassIndex) -> Self {
        Self { index }
    }

    pub(crate) fn is_model(&self, path: &str) -> bool {
        path != django::MODEL && self.index.is_subclass(path, django::MODEL)
    }

    /// Model classes in discovery order.
    pub(crate) fn model_classes(&self) -> Vec<&'a ClassInfo> {
        self.index.collect_subclasses(&[django::MODEL])
    }

    pub(crate) fn build(&self, info: &ClassInfo, app_label: String, app: String) -> ModelClass {
        let meta = self.meta(info, 0);
        let fields = self.fields(info, &meta, 0);
        let attributes = self.attributes(info, &fields);
        ModelClass {
            path: info.path.clone(),
            name: info.name().to_owned(),
            module: info.module.clone(),
            app_label,
            app,
            location: info.location(),
            meta,
            fields,
            attributes,
        }
    }

    /// Project model parents, in base order.
    fn model_parents(&self, info: &ClassInfo) -> Vec<&'a ClassInfo> {
        info.bases
            .iter()
            .filter(|b| self.is_model(b))
            .filter_map(|b| self.index.class(b))
            .collect()
    }

    pub(crate) fn meta(&self, info: &ClassInfo, depth: usize) -> ModelMeta {
        if depth > MAX_INHERITANCE_DEPTH {
            return ModelMeta::default();
        }
        if let Some(meta_def) = info.def.nested_class("Meta") {
            // `class Meta(Parent.Meta)` extends the parent's options.
            let base = meta_def
                .bases
                .iter()
                .filter_map(Expr::dotted)
                .filter_map(|b| b.strip_suffix(".Meta"))
                .filter_map(|owner| self.index.class(&self.index.resolve(&info.module, owner)))
                .map(|parent| ModelMeta {
                    is_abstract: false,
                    ..self.meta(parent, depth + 1)
                })
                .next()
                .unwrap_or_default();
            return ModelMeta::from_class(meta_def, base);
        }
        self.model_parents(info)
            .into_iter()
            .map(|parent| self.meta(parent, depth + 1))
            .find(|meta| meta.is_abstract)
            .map(|meta| ModelMeta {
                is_abstract: false,
                ..meta
            })
            .unwrap_or_default()
    }

    fn fields(&self, info: &ClassInfo, meta: &ModelMeta, depth: usize) -> Vec<Field> {
        let mut fields: Vec<Field> = Vec::new();
        if depth > MAX_INHERITANCE_DEPTH || meta.proxy {
            return fields;
        }

        let mut has_concrete_parent = false;
        for parent in self.model_parents(info) {
            let parent_meta = self.meta(parent, depth + 1);
            if parent_meta.is_abstract {
                for field in self.fields(parent, &parent_meta, depth + 1) {
                    if !field.auto_created {
                        upsert(&mut fields, field);
                    }
                }
            } else {
                has_concrete_parent = true;
            }
        }

        for assign in info.def.assignments() {
            let Some(call) = assign.value.as_ref().and_then(Expr::as_call) else {
                continue;
            };
            let Some(func) = call.func_name() else { continue };
            let class_path = self.index.resolve(&info.module, func);
            if !self.index.is_subclass(&class_path, django::FIELD) {
                continue;
            }
            for name in &assign.targets {
                let field = self.field_from_call(info, name, &class_path, call);
                upsert(&mut fields, field);
            }
        }

        let has_pk = fields.iter().any(|f| f.primary_key);
        if !meta.is_abstract && !has_pk && !has_concrete_parent {
            fields.insert(0, Field::auto_id(&info.path));
        }
        fields
    }

    fn field_from_call(&self, info: &ClassInfo, name: &str, class_path: &str, call: &Call) -> Field {
        let mut ancestry = vec![class_path.to_owned()];
        ancestry.extend(self.index.ancestors(class_path));
        let mut field = Field {
            name: name.to_owned(),
            class_path: class_path.to_owned(),
            ancestry,
            declared_in: info.path.clone(),
            auto_created: false,
            null: Some(false),
            blank: false,
            primary_key: false,
            upload_to: false,
            related_name: None,
            default: FieldDefault::Missing,
            choices: None,
        };

        field.null = match call.keyword("null") {
            Some(value) => value.as_bool(),
            None => Some(field.is_instance("NullBooleanField")),
        };
        field.blank = call.keyword("blank").and_then(Expr::as_bool) == Some(true);
        field.primary_key = call.keyword("primary_key").and_then(Expr::as_bool) == Some(true);

        if field.is_instance("FileField") {
            let upload_to = call.keyword("upload_to").or_else(|| call.args.get(2));
            field.upload_to = upload_to.is_some_and(|v| v.truthy() != Some(false));
        }

        field.related_name = match call.keyword("related_name") {
            Some(Expr::Str(s)) if s.is_empty() => None,
            Some(Expr::Str(s)) => Some(s.clone()),
            Some(Expr::None) | None => None,
            Some(other) => Some(expr_text(other)),
        };
        if field.related_name.is_none()
            && field.is_instance("django.contrib.contenttypes.fields.GenericRelation")
        {
            field.related_name = Some("+".to_owned());
        }

        field.default = match call.keyword("default") {
            None => FieldDefault::Missing,
            Some(Expr::None) => FieldDefault::None,
            Some(_) => FieldDefault::Value,
        };
        field.choices = call
            .keyword("choices")
            .and_then(|c| self.resolve_choices(info, c));
        field
    }

    fn resolve_choices(&self, info: &ClassInfo, expr: &Expr) -> Option<Vec<ChoiceValue>> {
        match expr {
            Expr::List(_) | Expr::Tuple(_) => flatten_choices(expr),
            Expr::Dict(items) => items.iter().map(|(k, _)| ChoiceValue::from_expr(k)).collect(),
            Expr::Name(name) | Expr::Attribute(name) => {
                let class_name = name.strip_suffix(".choices").unwrap_or(name);
                let class_path = self.index.resolve(&info.module, class_name);
                if let Some(choices) = self.index.class(&class_path) {
                    if self.index.is_subclass(&class_path, django::CHOICES) {
                        return enum_members(&choices.def);
                    }
                }
                if name.contains('.') {
                    return self.index.constant(&info.module, name).and_then(flatten_choices);
                }
                // Class attributes shadow module constants.
                match info.def.assignment(name).and_then(|a| a.value.as_ref()) {
                    Some(value) => flatten_choices(value),
                    None => self.index.constant(&info.module, name).and_then(flatten_choices),
                }
            }
            _ => None,
        }
    }

    fn attributes(&self, info: &ClassInfo, fields: &[Field]) -> BTreeSet<String> {
        let mut attributes: BTreeSet<String> =
            MODEL_ATTRIBUTES.iter().map(|s| (*s).to_owned()).collect();
        let mut has_manager = false;
        let chain = std::iter::once(info.path.clone()).chain(self.index.ancestors(&info.path));
        for path in chain {
            let Some(class) = self.index.class(&path) else { continue };
            attributes.extend(class.def.bound_names().map(String::from));
            has_manager |= class.def.assignments().any(|a| {
                a.value
                    .as_ref()
                    .and_then(Expr::as_call)
                    .and_then(Call::func_name)
                    .is_some_and(is_manager_call)
            });
        }
        if !has_manager {
            attributes.insert("objects".to_owned());
        }
        for field in fields {
            attributes.insert(field.name.clone());
            if field.many_to_one() || field.is_instance("OneToOneField") {
                attributes.insert(format!("{}_id", field.name));
            }
        }
        attributes
    }
}

fn is_manager_call(func: &str) -> bool {
    let last = func.rsplit('.').next().unwrap_or(func);
    last.ends_with("Manager") || last == "as_manager"
}

fn upsert(fields: &mut Vec<Field>, field: Field) {
    match fields.iter_mut().find(|f| f.name == field.name) {
        Some(existing) => *existing = field,
        None => fields.push(field),
    }
}

fn expr_text(expr: &Expr) -> String {
    match expr {
        Expr::Other(text) => text.clone(),
        Expr::Name(n) | Expr::Attribute(n) => n.clone(),
        _ => String::from("<expr>"),
    }
}

/// Values of `[(value, label), (group, [(value, label)])]`.
fn flatten_choices(expr: &Expr) -> Option<Vec<ChoiceValue>> {
    let mut values = Vec::new();
    for item in expr.elements()? {
        let pair = item.elements()?;
        let [value, label] = pair else { return None };
        match label.elements() {
            Some(group) => {
                for entry in group {
                    values.push(ChoiceValue::from_expr(entry.elements()?.first()?)?);
                }
            }
            None => values.push(ChoiceValue::from_expr(value)?),
        }
    }
    Some(values)
}

/// Member values of a `TextChoices` / `IntegerChoices` class.
fn enum_members(def: &ClassDef) -> Option<Vec<ChoiceValue>> {
    let mut values = Vec::new();
    for assign in def.assignments() {
        let Some(value) = &assign.value else { continue };
        for target in &assign.targets {
            if target == "__empty__" {
                values.push(ChoiceValue::None);
                continue;
            }
            if target.starts_with('_') {
                continue;
            }
            let literal = match value {
                Expr::Tuple(items) => items.first()?,
                other => other,
            };
            values.push(ChoiceValue::from_expr(literal)?);
        }
    }
    // `__empty__` sorts first, like the framework does.
    values.sort_by(|a, b| match (a, b) {
        (ChoiceValue::None, ChoiceValue::None) => Ordering::Equal,
        (ChoiceValue::None, _) => Ordering::Less,
        (_, ChoiceValue::None) => Ordering::Greater,
        _ => Ordering::Equal,
    });
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::resolve::SourceFile;

    fn build(source: &str) -> Vec<ModelClass> {
        let index = ClassIndex::build(&[SourceFile {
            path: "shop/models.py".into(),
            module: "shop.models".into(),
            is_package: false,
            is_site: false,
            ast: extra_checks_syntax::parse(source).unwrap(),
        }]);
        let builder = ModelBuilder::new(&index);
        builder
            .model_classes()
            .into_iter()
            .map(|info| builder.build(info, "shop".into(), "shop".into()))
            .collect()
    }

    const SOURCE: &str = r#"
from django.db import models
from django.utils.translation import gettext_lazy as _

STATUSES = [("new", "New"), ("Closed", [("done", "Done"), ("lost", "Lost")])]


class Kind(models.TextChoices):
    BOOK = "book", _("Book")
    FILM = "film"


class Stamped(models.Model):
    created = models.DateTimeField(auto_now_add=True)

    class Meta:
        abstract = True
        unique_together = ("created", "-owner")


class Order(Stamped):
    owner = models.ForeignKey("auth.User", on_delete=models.CASCADE, related_name="+")
    status = models.CharField(max_length=8, choices=STATUSES, blank=True)
    kind = models.CharField(max_length=8, choices=Kind.choices, null=True)
    scan = models.FileField(upload_to="")
    note = models.TextField(default=None, null=True)
    objects = OrderManager()

    def __str__(self):
        return self.status


class Archived(Order):
    class Meta:
        proxy = True
        constraints = [
            models.CheckConstraint(name="kind_valid", check=models.Q(kind__in=["book", "film", None])),
            models.UniqueConstraint(fields=["status"], name="u"),
        ]
"#;

    #[test]
    fn meta_is_inherited_from_abstract_parent() {
        let models = build(SOURCE);
        let order = models.iter().find(|m| m.name == "Order").unwrap();
        assert!(!order.meta.is_abstract);
        assert_eq!(order.meta.unique_together, vec![vec!["created", "-owner"]]);
        assert!(order.meta.index_field_names().contains("owner"));
        assert!(order.is_concrete());
    }

    #[test]
    fn fields_include_inherited_and_auto_id() {
        let models = build(SOURCE);
        let order = models.iter().find(|m| m.name == "Order").unwrap();
        let names: Vec<&str> = order.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "created", "owner", "status", "kind", "scan", "note"]);
        assert!(order.fields[0].auto_created);
        assert_eq!(order.field("created").unwrap().declared_in, "shop.models.Stamped");

        let stamped = models.iter().find(|m| m.name == "Stamped").unwrap();
        assert!(stamped.field("id").is_none());
        let archived = models.iter().find(|m| m.name == "Archived").unwrap();
        assert!(archived.fields.is_empty());
    }

    #[test]
    fn field_flags() {
        let models = build(SOURCE);
        let order = models.iter().find(|m| m.name == "Order").unwrap();
        let owner = order.field("owner").unwrap();
        assert!(owner.many_to_one());
        assert!(!owner.empty_strings_allowed());
        assert_eq!(owner.related_name.as_deref(), Some("+"));
        assert!(!order.field("scan").unwrap().upload_to);
        let note = order.field("note").unwrap();
        assert!(note.is_null());
        assert_eq!(note.default, FieldDefault::None);
        assert!(note.is_instance("TextField"));
    }

    #[test]
    fn choices_are_resolved() {
        let models = build(SOURCE);
        let order = models.iter().find(|m| m.name == "Order").unwrap();
        let status = order.field("status").unwrap().choices.clone().unwrap();
        assert_eq!(
            status,
            vec![
                ChoiceValue::Str("new".into()),
                ChoiceValue::Str("done".into()),
                ChoiceValue::Str("lost".into())
            ]
        );
        let kind = order.field("kind").unwrap().choices.clone().unwrap();
        assert_eq!(kind.iter().map(ChoiceValue::repr).collect::<Vec<_>>(), vec!["\"book\"", "\"film\""]);
    }

    #[test]
    fn attributes_and_constraints() {
        let models = build(SOURCE);
        let order = models.iter().find(|m| m.name == "Order").unwrap();
        assert!(order.has_attr("__str__"));
        assert!(order.has_attr("owner_id"));
        assert!(order.has_attr("objects"));
        assert!(!order.has_attr("get_absolute_url"));

        let archived = models.iter().find(|m| m.name == "Archived").unwrap();
        let check = &archived.meta.check_constraints[0];
        assert_eq!(check.name.as_deref(), Some("kind_valid"));
        assert_eq!(check.in_lookups["kind__in"].len(), 3);
        assert_eq!(archived.meta.unique_constraints, vec![vec!["status"]]);
    }
}
