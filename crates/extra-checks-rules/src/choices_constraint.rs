//! Choices enforced by the database (X060).
//!
//! # Rationale
//!
//! `choices` is only validated by forms. Without a companion
//! `CheckConstraint` any value can be written through the ORM or raw SQL.
//!
//! # Autofix
//!
//! When the field is declared in the checked model itself, the diagnostic
//! carries a [`Replacement`] that adds the constraint:
//!
//! - replacing an outdated constraint of the same name,
//! - prepended to an existing `Meta.constraints` list,
//! - as a new `constraints` assignment at the end of an existing `Meta`,
//! - or in a new `class Meta` block at the end of the class body.
//!
//! Only the first unfixed field of a class gets one of the last two
//! edits; the others are fixed by prepending on the next pass.

use std::collections::BTreeSet;

use extra_checks_core::project::{ChoiceValue, Field, ModelClass};
use extra_checks_core::{
    Check, CheckBase, CheckId, ClassView, Diagnostic, FieldCheck, FieldSource, Location, Replacement,
    SourceUnavailable,
};
use extra_checks_core::syntax::Expr;
use tracing::debug;

/// Requires fields with choices to have a matching `CheckConstraint`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldChoicesConstraint;

impl FieldChoicesConstraint {
    /// Creates the check.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Values the column may hold: the choices plus `""` and `None` when
/// `blank` and `null` allow them.
fn allowed_values(field: &Field, choices: &[ChoiceValue]) -> Vec<ChoiceValue> {
    let mut values = choices.to_vec();
    let empty = ChoiceValue::Str(String::new());
    if field.blank && field.empty_strings_allowed() && !values.contains(&empty) {
        values.push(empty);
    }
    if field.is_null() && !values.contains(&ChoiceValue::None) {
        values.push(ChoiceValue::None);
    }
    values
}

fn constraint_name(field: &Field) -> String {
    format!("%(app_label)s_%(class)s_{}_valid", field.name)
}

impl Check for FieldChoicesConstraint {
    fn id(&self) -> CheckId {
        CheckId::X060
    }
}

/// The values `field` must be constrained to, or `None` when it has no
/// choices or `model` already enforces them.
fn unenforced_values(model: &ModelClass, field: &Field) -> Option<Vec<ChoiceValue>> {
    let choices = field.choices.as_deref().filter(|c| !c.is_empty())?;
    let values = allowed_values(field, choices);
    let lookup = format!("{}__in", field.name);
    let wanted: BTreeSet<&ChoiceValue> = values.iter().collect();
    let enforced = model.meta.check_constraints.iter().any(|constraint| {
        constraint
            .in_lookups
            .get(&lookup)
            .is_some_and(|existing| existing.iter().collect::<BTreeSet<_>>() == wanted)
    });
    (!enforced).then_some(values)
}

/// Whether `field` is the first field of `model` that would get a fix.
fn is_first_fixable(model: &ModelClass, field: &Field, view: &ClassView<'_>) -> bool {
    model
        .fields
        .iter()
        .find(|f| {
            f.declared_in == model.path
                && unenforced_values(model, f).is_some()
                && !view.field(&f.name, f.is_related()).is_disabled_by_comment(CheckId::X060)
        })
        .is_some_and(|f| f.name == field.name)
}

impl FieldCheck for FieldChoicesConstraint {
    fn apply(
        &self,
        base: &CheckBase,
        model: &ModelClass,
        field: &Field,
        source: &FieldSource<'_>,
    ) -> Result<Vec<Diagnostic>, SourceUnavailable> {
        let Some(values) = unenforced_values(model, field) else {
            return Ok(Vec::new());
        };

        let lookup = format!("{}__in", field.name);
        let reprs: Vec<String> = values.iter().map(ChoiceValue::repr).collect();
        let check = format!("models.Q({lookup}=[{}])", reprs.join(", "));
        let constraint = format!(
            "models.CheckConstraint(name=\"{}\", check={check})",
            constraint_name(field)
        );
        let mut diagnostic = base.message(
            "Field with choices must have companion CheckConstraint to enforce choices on database level.",
            format!("Add to Meta.constraints: `{constraint}`"),
        );
        if field.declared_in == model.path {
            let view = source.view();
            let creates = is_first_fixable(model, field, view);
            if let Some(fix) = constraint_fix(view, &constraint_name(field), &constraint, creates) {
                diagnostic = diagnostic.with_fix(fix);
            }
        } else {
            debug!(field = %field.name, declared_in = %field.declared_in, "No autofix for inherited field");
        }
        Ok(vec![diagnostic])
    }
}

/// Location just past the end of snippet line `line`.
fn end_of_line(view: &ClassView<'_>, line: usize) -> Option<Location> {
    let source = view.source()?;
    let text = source.line(line)?;
    Some(Location::new(
        source.path.clone(),
        source.file_line(line),
        source.indent + text.len() + 1,
    ))
}

/// Whether `item` is a call passing `name=<name>`.
fn is_named(item: &Expr, name: &str) -> bool {
    matches!(item, Expr::Call(call) if call.keyword("name").and_then(Expr::as_str) == Some(name))
}

/// Builds the edit adding `constraint` (called `name`) to the class in
/// `view`. Edits that create `Meta` or its `constraints` list are only
/// made when `creates` is set.
fn constraint_fix(view: &ClassView<'_>, name: &str, constraint: &str, creates: bool) -> Option<Replacement> {
    let class = view.class_def()?;
    let indent = view.source()?.indent;

    let Some(meta) = class.nested_class("Meta") else {
        if !creates {
            return None;
        }
        let pad = " ".repeat(indent + class.body_column);
        let location = end_of_line(view, class.last_body_line())?;
        return Some(Replacement::insert(
            location,
            format!("\n\n{pad}class Meta:\n{pad}    constraints = [{constraint}]"),
        ));
    };

    if let Some(assign) = meta.assignment("constraints") {
        let items = assign.value.as_ref().and_then(|v| match v {
            Expr::List(items) => Some(items),
            _ => None,
        })?;
        if let Some(index) = items.iter().position(|item| is_named(item, name)) {
            let location = view.span_location(*assign.element_spans.get(index)?)?;
            return Some(Replacement {
                location,
                new_text: constraint.to_owned(),
            });
        }
        let start = assign.value_start;
        let location = view.file_position(start.line, start.column + 1)?;
        let text = if items.is_empty() {
            constraint.to_owned()
        } else {
            format!("{constraint}, ")
        };
        return Some(Replacement::insert(location, text));
    }

    if !creates {
        return None;
    }
    let pad = " ".repeat(indent + meta.body_column);
    let location = end_of_line(view, meta.last_body_line())?;
    Some(Replacement::insert(location, format!("\n{pad}constraints = [{constraint}]")))
}
