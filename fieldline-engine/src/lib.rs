pub mod builder;
pub mod cache;
pub mod field;
pub mod formula;
pub mod projection;
pub mod validation;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum FormulaError {
        #[error("invalid formula `{formula}`: {reason}")]
        InvalidFormula { formula: String, reason: String },
        #[error("division by zero in formula `{formula}`")]
        DivisionByZero { formula: String },
    }

    impl FormulaError {
        pub(crate) fn invalid(formula: &str, reason: impl Into<String>) -> Self {
            Self::InvalidFormula {
                formula: formula.to_string(),
                reason: reason.into(),
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum GeometryError {
        #[error(transparent)]
        Formula(#[from] FormulaError),
        #[error("invalid dimension {name} = {value}")]
        InvalidDimensions { name: &'static str, value: f64 },
        #[error("{field} resolved to a negative or non-finite extent {value}")]
        NegativeExtent { field: &'static str, value: f64 },
        #[error("element {element_id} could not be resolved: {source}")]
        UnresolvedElement {
            element_id: String,
            #[source]
            source: Box<GeometryError>,
        },
    }

    impl GeometryError {
        /// 若错误来自某个模板元素，返回其 ID。
        pub fn element_id(&self) -> Option<&str> {
            match self {
                GeometryError::UnresolvedElement { element_id, .. } => Some(element_id),
                _ => None,
            }
        }

        /// 剥离 `UnresolvedElement` 包装后的原始错误。
        pub fn root_cause(&self) -> &GeometryError {
            match self {
                GeometryError::UnresolvedElement { source, .. } => source.root_cause(),
                other => other,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum FieldBoundsError {
        #[error("{dimension} {value} m is outside [{min}, {max}] allowed by template {sport}")]
        OutOfBounds {
            sport: String,
            dimension: &'static str,
            value: f64,
            min: f64,
            max: f64,
        },
        #[error("scale must be a positive number of pixels per meter, got {0}")]
        NonPositiveScale(f64),
    }

    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum RenderError {
        #[error(transparent)]
        Bounds(#[from] FieldBoundsError),
        #[error(transparent)]
        Geometry(#[from] GeometryError),
    }
}
