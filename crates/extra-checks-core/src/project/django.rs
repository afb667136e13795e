//! Known framework classes the index cannot read from the project.

/// Base of every model.
pub const MODEL: &str = "django.db.models.Model";
/// Base of every model field.
pub const FIELD: &str = "django.db.models.Field";
/// Base of every serializer.
pub const SERIALIZER: &str = "rest_framework.serializers.Serializer";
/// Base of model-bound serializers.
pub const MODEL_SERIALIZER: &str = "rest_framework.serializers.ModelSerializer";
/// Metaclass of every model.
pub const MODEL_BASE: &str = "django.db.models.base.ModelBase";
/// Metaclass of every serializer.
pub const SERIALIZER_METACLASS: &str = "rest_framework.serializers.SerializerMetaclass";
/// Base of enumeration choices.
pub const CHOICES: &str = "django.db.models.Choices";

/// Option names a model `Meta` accepts.
pub const META_OPTIONS: &[&str] = &[
    "verbose_name",
    "verbose_name_plural",
    "db_table",
    "ordering",
    "unique_together",
    "permissions",
    "get_latest_by",
    "order_with_respect_to",
    "app_label",
    "db_tablespace",
    "abstract",
    "managed",
    "proxy",
    "swappable",
    "auto_created",
    "index_together",
    "apps",
    "default_permissions",
    "select_on_save",
    "default_related_name",
    "required_db_features",
    "required_db_vendor",
    "base_manager_name",
    "default_manager_name",
    "indexes",
    "constraints",
    "db_table_comment",
];

/// `(class, parent)` pairs below `django.db.models`.
const MODEL_CLASSES: &[(&str, &str)] = &[
    ("Model", ""),
    ("Field", ""),
    ("CharField", "Field"),
    ("TextField", "Field"),
    ("SlugField", "CharField"),
    ("EmailField", "CharField"),
    ("URLField", "CharField"),
    ("CommaSeparatedIntegerField", "CharField"),
    ("FilePathField", "Field"),
    ("IntegerField", "Field"),
    ("BigIntegerField", "IntegerField"),
    ("SmallIntegerField", "IntegerField"),
    ("PositiveIntegerField", "IntegerField"),
    ("PositiveSmallIntegerField", "SmallIntegerField"),
    ("PositiveBigIntegerField", "BigIntegerField"),
    ("AutoField", "IntegerField"),
    ("BigAutoField", "BigIntegerField"),
    ("SmallAutoField", "SmallIntegerField"),
    ("BooleanField", "Field"),
    ("NullBooleanField", "BooleanField"),
    ("DateField", "Field"),
    ("DateTimeField", "DateField"),
    ("TimeField", "Field"),
    ("DurationField", "Field"),
    ("DecimalField", "Field"),
    ("FloatField", "Field"),
    ("UUIDField", "Field"),
    ("JSONField", "Field"),
    ("BinaryField", "Field"),
    ("GenericIPAddressField", "Field"),
    ("IPAddressField", "Field"),
    ("FileField", "Field"),
    ("ImageField", "FileField"),
    ("RelatedField", "Field"),
    ("ForeignObject", "RelatedField"),
    ("ForeignKey", "ForeignObject"),
    ("OneToOneField", "ForeignKey"),
    ("ManyToManyField", "RelatedField"),
    ("Choices", ""),
    ("TextChoices", "Choices"),
    ("IntegerChoices", "Choices"),
];

/// Submodules of `django.db.models` that define the classes above.
const MODEL_SUBMODULES: &[&str] = &[
    "django.db.models.base",
    "django.db.models.enums",
    "django.db.models.fields",
    "django.db.models.fields.related",
    "django.db.models.fields.files",
    "django.db.models.fields.json",
];

/// Other framework classes, fully qualified.
const OTHER_CLASSES: &[(&str, &str)] = &[
    (
        "django.contrib.contenttypes.fields.GenericRelation",
        "django.db.models.ForeignObject",
    ),
    ("django.contrib.postgres.fields.ArrayField", FIELD),
    ("django.contrib.postgres.fields.HStoreField", FIELD),
    ("rest_framework.serializers.BaseSerializer", "rest_framework.fields.Field"),
    (SERIALIZER, "rest_framework.serializers.BaseSerializer"),
    (MODEL_SERIALIZER, SERIALIZER),
    (
        "rest_framework.serializers.HyperlinkedModelSerializer",
        MODEL_SERIALIZER,
    ),
    (
        "rest_framework.serializers.ListSerializer",
        "rest_framework.serializers.BaseSerializer",
    ),
    ("rest_framework.fields.Field", ""),
];

/// Maps an alias such as `django.db.models.fields.CharField` to its
/// public path.
#[must_use]
pub fn canonical(path: &str) -> String {
    if let Some((module, name)) = path.rsplit_once('.') {
        if MODEL_SUBMODULES.contains(&module) && MODEL_CLASSES.iter().any(|(c, _)| *c == name) {
            return format!("django.db.models.{name}");
        }
        if module == "rest_framework.serializers" && !is_known(path) {
            return format!("rest_framework.fields.{name}");
        }
    }
    path.to_owned()
}

/// Whether `path` is a framework class this module knows.
#[must_use]
pub fn is_known(path: &str) -> bool {
    parent(path).is_some()
}

/// Parent of a known framework class; `Some("")` for roots.
fn parent(path: &str) -> Option<&'static str> {
    if let Some(name) = path.strip_prefix("django.db.models.") {
        if let Some((_, parent)) = MODEL_CLASSES.iter().find(|(c, _)| *c == name) {
            return Some(parent);
        }
    }
    OTHER_CLASSES
        .iter()
        .find(|(c, _)| *c == path)
        .map(|(_, parent)| *parent)
}

/// Known ancestors of a framework class, nearest first.
#[must_use]
pub fn ancestors(path: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = path.to_owned();
    while let Some(parent) = parent(&current) {
        if parent.is_empty() {
            break;
        }
        let parent = if parent.contains('.') {
            parent.to_owned()
        } else {
            format!("django.db.models.{parent}")
        };
        result.push(parent.clone());
        current = parent;
    }
    result
}

/// Public path of a field class short name, e.g. `ForeignKey`.
#[must_use]
pub fn model_class(name: &str) -> String {
    format!("django.db.models.{name}")
}
