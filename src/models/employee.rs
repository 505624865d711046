//! Employee model and related types.
//!
//! Employees are owned by the (external) employee directory; the engine only
//! reads them. HR edits go through [`EmployeePatch`], which is validated as a
//! whole before any field is applied.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// An employee as seen by the payroll engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// The employer (company) the employee belongs to.
    pub company_id: String,
    /// Display name.
    pub name: String,
    /// Base monthly salary.
    pub base_salary: Decimal,
}

/// Filter used to enumerate employees from the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeFilter {
    /// Restrict to employees of this company.
    #[serde(default)]
    pub company_id: Option<String>,
}

impl EmployeeFilter {
    /// A filter matching every employee of the given company.
    pub fn company(company_id: impl Into<String>) -> Self {
        Self {
            company_id: Some(company_id.into()),
        }
    }

    /// Returns true if the employee passes the filter.
    pub fn matches(&self, employee: &Employee) -> bool {
        self.company_id
            .as_deref()
            .is_none_or(|company| employee.company_id == company)
    }
}

/// A partial update to an employee.
///
/// Every field is optional; `None` leaves the field untouched. Identity
/// (`id`, `company_id`) cannot be patched.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{Employee, EmployeePatch};
/// use rust_decimal::Decimal;
///
/// let employee = Employee {
///     id: "emp_001".to_string(),
///     company_id: "acme".to_string(),
///     name: "Ana".to_string(),
///     base_salary: Decimal::new(1_000_000, 0),
/// };
/// let patch = EmployeePatch {
///     base_salary: Some(Decimal::new(1_200_000, 0)),
///     ..EmployeePatch::default()
/// };
///
/// let updated = patch.apply(&employee).unwrap();
/// assert_eq!(updated.base_salary, Decimal::new(1_200_000, 0));
/// assert_eq!(updated.name, "Ana");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeePatch {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New base monthly salary.
    #[serde(default)]
    pub base_salary: Option<Decimal>,
}

impl EmployeePatch {
    /// Returns true if the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.base_salary.is_none()
    }

    /// Validates every present field.
    pub fn validate(&self) -> EngineResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(EngineError::validation("name", "must not be blank"));
            }
        }
        if let Some(salary) = self.base_salary {
            if salary.is_sign_negative() {
                return Err(EngineError::validation(
                    "base_salary",
                    format!("must not be negative, got {}", salary),
                ));
            }
        }
        Ok(())
    }

    /// Validates the patch and returns the patched copy of `employee`.
    ///
    /// Either every field is applied or, on a validation error, none is.
    pub fn apply(&self, employee: &Employee) -> EngineResult<Employee> {
        self.validate()?;

        let mut updated = employee.clone();
        if let Some(name) = &self.name {
            updated.name = name.trim().to_string();
        }
        if let Some(salary) = self.base_salary {
            updated.base_salary = salary;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_employee() -> Employee {
        Employee {
            id: "emp_001".to_string(),
            company_id: "acme".to_string(),
            name: "Ana Rojas".to_string(),
            base_salary: Decimal::new(1_000_000, 0),
        }
    }

    #[test]
    fn test_deserialize_employee() {
        let json = r#"{
            "id": "emp_001",
            "company_id": "acme",
            "name": "Ana Rojas",
            "base_salary": "1000000"
        }"#;

        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee, create_test_employee());
    }

    #[test]
    fn test_filter_matches_company() {
        let employee = create_test_employee();
        assert!(EmployeeFilter::company("acme").matches(&employee));
        assert!(!EmployeeFilter::company("globex").matches(&employee));
        assert!(EmployeeFilter::default().matches(&employee));
    }

    #[test]
    fn test_patch_applies_present_fields_only() {
        let employee = create_test_employee();
        let patch = EmployeePatch {
            name: Some("  Ana María Rojas ".to_string()),
            base_salary: None,
        };

        let updated = patch.apply(&employee).unwrap();
        assert_eq!(updated.name, "Ana María Rojas");
        assert_eq!(updated.base_salary, employee.base_salary);
        assert_eq!(updated.id, employee.id);
    }

    #[test]
    fn test_patch_rejects_negative_salary_without_partial_apply() {
        let employee = create_test_employee();
        let patch = EmployeePatch {
            name: Some("New Name".to_string()),
            base_salary: Some(Decimal::new(-1, 0)),
        };

        match patch.apply(&employee) {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "base_salary"),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_patch_rejects_blank_name() {
        let patch = EmployeePatch {
            name: Some("   ".to_string()),
            base_salary: None,
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_empty_patch() {
        assert!(EmployeePatch::default().is_empty());
        assert!(
            !EmployeePatch {
                base_salary: Some(Decimal::ONE),
                ..EmployeePatch::default()
            }
            .is_empty()
        );
    }

    #[test]
    fn test_deserialize_partial_patch() {
        let patch: EmployeePatch = serde_json::from_str(r#"{"base_salary": "1200000"}"#).unwrap();
        assert_eq!(patch.base_salary, Some(Decimal::new(1_200_000, 0)));
        assert!(patch.name.is_none());
    }
}
