use std::collections::HashSet;
use std::fmt;

use fieldline_core::template::{Element, FormulaOrNumber, TemplateDefinition};
use tracing::debug;

use crate::builder::resolve_element;
use crate::formula::{Formula, FormulaVars};

/// 结构性字面量（原点、取半等）不要求登记在 `specifications` 中。
const STRUCTURAL_LITERALS: [f64; 3] = [0.0, 1.0, 2.0];
const CONSTANT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationIssueKind {
    UnknownFixedElement {
        element_id: String,
    },
    DuplicateElementId {
        element_id: String,
    },
    BoundsOrder {
        dimension: &'static str,
        min: f64,
        default: f64,
        max: f64,
    },
    InvalidElement {
        element_id: String,
        message: String,
    },
    UnlistedConstant {
        element_id: String,
        field: &'static str,
        value: f64,
    },
}

/// 模板编辑阶段的校验结果。`Error` 必须修正，`Warning` 仅为提示。
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub kind: ValidationIssueKind,
}

impl ValidationIssue {
    fn error(kind: ValidationIssueKind) -> Self {
        Self {
            severity: Severity::Error,
            kind,
        }
    }

    fn warning(kind: ValidationIssueKind) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match &self.kind {
            ValidationIssueKind::UnknownFixedElement { element_id } => {
                write!(f, "{level}: fixed element `{element_id}` does not exist")
            }
            ValidationIssueKind::DuplicateElementId { element_id } => {
                write!(f, "{level}: element id `{element_id}` is used more than once")
            }
            ValidationIssueKind::BoundsOrder {
                dimension,
                min,
                default,
                max,
            } => write!(
                f,
                "{level}: {dimension} bounds must satisfy min <= default <= max (got {min} / {default} / {max})"
            ),
            ValidationIssueKind::InvalidElement {
                element_id,
                message,
            } => write!(f, "{level}: element `{element_id}`: {message}"),
            ValidationIssueKind::UnlistedConstant {
                element_id,
                field,
                value,
            } => write!(
                f,
                "{level}: element `{element_id}` {field} uses constant {value} not listed in specifications"
            ),
        }
    }
}

/// 校验模板定义，返回全部问题（空表示通过）。
pub fn validate_template(template: &TemplateDefinition) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    check_bounds_order(template, &mut issues);

    let mut seen = HashSet::new();
    for element in &template.elements {
        if !seen.insert(element.id.as_str()) {
            issues.push(ValidationIssue::error(
                ValidationIssueKind::DuplicateElementId {
                    element_id: element.id.clone(),
                },
            ));
        }
    }

    for id in &template.fixed_elements {
        if template.element(id).is_none() {
            issues.push(ValidationIssue::error(
                ValidationIssueKind::UnknownFixedElement {
                    element_id: id.clone(),
                },
            ));
        }
    }

    let vars = FormulaVars::new(template.default_width, template.default_length);
    for element in &template.elements {
        if let Err(err) = resolve_element(element, &vars) {
            issues.push(ValidationIssue::error(ValidationIssueKind::InvalidElement {
                element_id: element.id.clone(),
                message: err.root_cause().to_string(),
            }));
        }
        lint_constants(template, element, &mut issues);
    }

    debug!(
        sport = %template.sport,
        issues = issues.len(),
        "模板校验完成"
    );
    issues
}

#[inline]
pub fn has_errors(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(ValidationIssue::is_error)
}

fn check_bounds_order(template: &TemplateDefinition, issues: &mut Vec<ValidationIssue>) {
    let dimensions = [
        (
            "length",
            template.min_length,
            template.default_length,
            template.max_length,
        ),
        (
            "width",
            template.min_width,
            template.default_width,
            template.max_width,
        ),
    ];
    for (dimension, min, default, max) in dimensions {
        if !(min <= default && default <= max) {
            issues.push(ValidationIssue::error(ValidationIssueKind::BoundsOrder {
                dimension,
                min,
                default,
                max,
            }));
        }
    }
}

fn lint_constants(
    template: &TemplateDefinition,
    element: &Element,
    issues: &mut Vec<ValidationIssue>,
) {
    let mut reported: Vec<f64> = Vec::new();
    for (field, value) in element.shape.values() {
        let literals = match value {
            FormulaOrNumber::Number(number) => vec![*number],
            // 解析失败已由构建检查报告
            FormulaOrNumber::Formula(source) => match Formula::parse(source) {
                Ok(formula) => formula.literals(),
                Err(_) => continue,
            },
        };
        for literal in literals {
            if is_structural(literal)
                || is_listed(template, literal)
                || reported.iter().any(|seen| (seen - literal).abs() < CONSTANT_TOLERANCE)
            {
                continue;
            }
            reported.push(literal);
            issues.push(ValidationIssue::warning(
                ValidationIssueKind::UnlistedConstant {
                    element_id: element.id.clone(),
                    field,
                    value: literal,
                },
            ));
        }
    }
}

fn is_structural(value: f64) -> bool {
    STRUCTURAL_LITERALS
        .iter()
        .any(|structural| (structural - value.abs()).abs() < CONSTANT_TOLERANCE)
}

fn is_listed(template: &TemplateDefinition, value: f64) -> bool {
    template
        .specifications
        .values()
        .any(|constant| (constant - value.abs()).abs() < CONSTANT_TOLERANCE)
}
