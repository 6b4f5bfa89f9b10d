use crate::descriptor::VariableDescriptor;
use crate::error::CoefficientDerivationError;

/// Where objective coefficients come from, one per registered variable
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum CoefficientSource {
    ProfitMargin,
    UnitCost,
    LowerBound,
    UpperBound,
    /// A caller-supplied list in registration order
    Explicit(Vec<f64>),
}

impl CoefficientSource {
    fn selector(&self) -> &'static str {
        match self {
            CoefficientSource::ProfitMargin => "profit margin",
            CoefficientSource::UnitCost => "unit cost",
            CoefficientSource::LowerBound => "lower bound",
            CoefficientSource::UpperBound => "upper bound",
            CoefficientSource::Explicit(_) => "explicit list",
        }
    }

    fn pick(&self, descriptor: &VariableDescriptor) -> Option<f64> {
        match self {
            CoefficientSource::ProfitMargin => descriptor.profit_margin(),
            CoefficientSource::UnitCost => descriptor.unit_cost(),
            CoefficientSource::LowerBound => descriptor.lower(),
            CoefficientSource::UpperBound => descriptor.upper(),
            CoefficientSource::Explicit(_) => None,
        }
    }

    /// Coefficients aligned with `descriptors`
    pub fn derive<'a, I>(&self, descriptors: I) -> Result<Vec<f64>, CoefficientDerivationError>
    where
        I: ExactSizeIterator<Item = &'a VariableDescriptor>,
    {
        let coefficients = match self {
            CoefficientSource::Explicit(list) => {
                if list.len() != descriptors.len() {
                    return Err(CoefficientDerivationError::LengthMismatch {
                        expected: descriptors.len(),
                        actual: list.len(),
                    });
                }
                descriptors.zip(list).map(|(d, &c)| (d, Some(c))).collect::<Vec<_>>()
            }
            _ => descriptors.map(|d| (d, self.pick(d))).collect(),
        };
        collect_finite(coefficients, self.selector())
    }
}

/// Coefficients computed by an arbitrary per-descriptor function
pub fn derive_with<'a, I, F>(descriptors: I, f: F) -> Result<Vec<f64>, CoefficientDerivationError>
where
    I: Iterator<Item = &'a VariableDescriptor>,
    F: Fn(&VariableDescriptor) -> Option<f64>,
{
    collect_finite(descriptors.map(|d| (d, f(d))).collect(), "custom selector")
}

fn collect_finite(
    picked: Vec<(&VariableDescriptor, Option<f64>)>,
    selector: &'static str,
) -> Result<Vec<f64>, CoefficientDerivationError> {
    picked
        .into_iter()
        .map(|(d, value)| match value {
            Some(v) if v.is_finite() => Ok(v),
            Some(_) => Err(CoefficientDerivationError::NotFinite(d.name().to_string())),
            None => Err(CoefficientDerivationError::Inapplicable {
                variable: d.name().to_string(),
                selector,
            }),
        })
        .collect()
}
