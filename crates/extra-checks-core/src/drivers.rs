//! Group drivers: target enumeration and dispatch.
//!
//! Every driver returns a lazy iterator. Targets are visited one at a
//! time and each target's diagnostics are produced only when the caller
//! pulls past the previous target.

use std::collections::HashMap;

use tracing::debug;

use crate::check::{CheckKind, CheckUnit, SerializerScope, Target};
use crate::config::ChecksConfig;
use crate::project::{ModelClass, Project, SerializerClass};
use crate::source::ClassView;
use crate::types::Diagnostic;

/// Runs the self-check against the bound configuration.
pub fn self_check<'a>(
    units: &'a [CheckUnit],
    config: &'a ChecksConfig,
    project: &'a Project,
    _apps: Option<&'a [String]>,
) -> Box<dyn Iterator<Item = Diagnostic> + 'a> {
    Box::new(
        units
            .iter()
            .flat_map(move |unit| unit.invoke(&Target::Config(config), None, project)),
    )
}

/// Runs model checks once per model, then field checks once per field.
pub fn check_models<'a>(
    units: &'a [CheckUnit],
    config: &'a ChecksConfig,
    project: &'a Project,
    apps: Option<&'a [String]>,
) -> Box<dyn Iterator<Item = Diagnostic> + 'a> {
    let (field_units, model_units): (Vec<&CheckUnit>, Vec<&CheckUnit>) = units
        .iter()
        .partition(|u| matches!(u.kind(), CheckKind::Field(_)));
    Box::new(
        project
            .models_to_check(apps, config.include_apps())
            .flat_map(move |model| check_model(model, &model_units, &field_units, project)),
    )
}

fn check_model(
    model: &ModelClass,
    model_units: &[&CheckUnit],
    field_units: &[&CheckUnit],
    project: &Project,
) -> Vec<Diagnostic> {
    debug!(model = %model.path, "Checking model");
    let view = ClassView::new(project.provider(), model.location.clone());
    let mut found: Vec<Diagnostic> = model_units
        .iter()
        .flat_map(|unit| unit.invoke(&Target::Model(model), Some(&view), project))
        .collect();

    if field_units.is_empty() {
        return found;
    }
    // Inherited fields are looked up in the class that declares them.
    let mut parents: HashMap<&str, ClassView<'_>> = HashMap::new();
    for field in &model.fields {
        let field_view = if field.declared_in == model.path {
            &view
        } else {
            &*parents.entry(field.declared_in.as_str()).or_insert_with(|| {
                ClassView::new(project.provider(), project.class_location(&field.declared_in))
            })
        };
        let target = Target::Field { model, field };
        for unit in field_units {
            found.extend(unit.invoke(&target, Some(field_view), project));
        }
    }
    found
}

/// Runs serializer checks on plain serializers, then on model serializers.
///
/// Serializers are restricted by `include_apps` only.
pub fn check_serializers<'a>(
    units: &'a [CheckUnit],
    config: &'a ChecksConfig,
    project: &'a Project,
    _apps: Option<&'a [String]>,
) -> Box<dyn Iterator<Item = Diagnostic> + 'a> {
    let (plain, bound) = project.serializers_to_check(config.include_apps());
    let scoped = |wanted: &[SerializerScope]| -> Vec<&'a CheckUnit> {
        units
            .iter()
            .filter(|u| match u.kind() {
                CheckKind::Serializer(check) => wanted.contains(&check.scope()),
                _ => false,
            })
            .collect()
    };
    let plain_units = scoped(&[SerializerScope::Plain]);
    let bound_units = scoped(&[SerializerScope::Model, SerializerScope::ModelMeta]);

    let plain = plain
        .into_iter()
        .flat_map(move |s| check_serializer(s, &plain_units, project));
    let bound = bound
        .into_iter()
        .flat_map(move |s| check_serializer(s, &bound_units, project));
    Box::new(plain.chain(bound))
}

fn check_serializer(serializer: &SerializerClass, units: &[&CheckUnit], project: &Project) -> Vec<Diagnostic> {
    if units.is_empty() {
        return Vec::new();
    }
    debug!(serializer = %serializer.path, "Checking serializer");
    let view = ClassView::new(project.provider(), serializer.location.clone());
    units
        .iter()
        .flat_map(|unit| unit.invoke(&Target::Serializer(serializer), Some(&view), project))
        .collect()
}
