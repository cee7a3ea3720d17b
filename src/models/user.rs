use serde::{Deserialize, Serialize};

/// A staff account on the attendance backend. The role is a free-form
/// server-assigned string; only "admin" is significant on the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffUser {
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl StaffUser {
    pub fn is_admin(&self) -> bool {
        self.role
            .as_deref()
            .map(|r| r.eq_ignore_ascii_case("admin"))
            .unwrap_or(false)
    }

    pub fn role_display(&self) -> &str {
        self.role.as_deref().unwrap_or("staff")
    }

    pub fn matches(&self, query: &str) -> bool {
        crate::utils::contains_ignore_case(&self.name, query)
            || crate::utils::contains_ignore_case(&self.username, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, username: &str, role: Option<&str>) -> StaffUser {
        StaffUser {
            name: name.to_string(),
            username: username.to_string(),
            role: role.map(|r| r.to_string()),
        }
    }

    #[test]
    fn test_is_admin_case_insensitive() {
        assert!(user("Root", "root", Some("admin")).is_admin());
        assert!(user("Root", "root", Some("Admin")).is_admin());
        assert!(!user("Desk", "desk", Some("operator")).is_admin());
        assert!(!user("Desk", "desk", None).is_admin());
    }

    #[test]
    fn test_role_display_default() {
        assert_eq!(user("Desk", "desk", None).role_display(), "staff");
        assert_eq!(user("Root", "root", Some("admin")).role_display(), "admin");
    }
}
