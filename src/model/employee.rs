use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

pub const UNKNOWN: &str = "Unknown";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AccountType {
    Employee,
    System,
}

/// Registry entry joined with its linked user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "employeeCode": "EMP-001",
        "firstName": "Ayesha",
        "lastName": "Khan",
        "department": "Finance",
        "designation": "Accountant",
        "shiftName": "morning",
        "isActive": true,
        "systemAccount": false,
        "nonBio": false,
        "accountActive": true,
        "accountType": "employee"
    })
)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub employee_code: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub shift_name: Option<String>,
    pub is_active: bool,
    pub system_account: bool,
    /// Biometric exempt.
    pub non_bio: bool,
    /// `None` when no user account is linked.
    pub account_active: Option<bool>,
    pub account_type: Option<AccountType>,
}

impl Employee {
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if name.is_empty() {
            UNKNOWN.to_string()
        } else {
            name
        }
    }

    pub fn department_or_unknown(&self) -> String {
        non_blank(self.department.as_deref()).unwrap_or(UNKNOWN).to_string()
    }

    pub fn designation_or_unknown(&self) -> String {
        non_blank(self.designation.as_deref()).unwrap_or(UNKNOWN).to_string()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Which registry rows may appear in roster views.
#[derive(Debug, Clone, Default)]
pub struct RosterFilter {
    /// Departments whose staff moved out of this system.
    pub excluded_departments: Vec<String>,
    /// Reserved names used for placeholder rows, e.g. `NOC`.
    pub placeholder_names: Vec<String>,
}

impl RosterFilter {
    pub fn admits(&self, employee: &Employee) -> bool {
        if !employee.is_active || employee.system_account {
            return false;
        }
        if employee.account_active != Some(true)
            || employee.account_type != Some(AccountType::Employee)
        {
            return false;
        }

        let department = non_blank(employee.department.as_deref());
        if department.is_some_and(|d| contains_ignore_case(&self.excluded_departments, d)) {
            return false;
        }

        let first_name = non_blank(employee.first_name.as_deref());
        ![department, first_name]
            .into_iter()
            .flatten()
            .any(|v| contains_ignore_case(&self.placeholder_names, v))
    }
}

fn contains_ignore_case(haystack: &[String], needle: &str) -> bool {
    haystack.iter().any(|h| h.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
pub(crate) fn employee(code: &str, first: &str, department: &str) -> Employee {
    Employee {
        employee_code: code.to_string(),
        first_name: Some(first.to_string()),
        last_name: None,
        department: Some(department.to_string()),
        designation: Some("Officer".to_string()),
        shift_name: None,
        is_active: true,
        system_account: false,
        non_bio: false,
        account_active: Some(true),
        account_type: Some(AccountType::Employee),
    }
}
