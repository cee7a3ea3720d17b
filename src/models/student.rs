use serde::{Deserialize, Serialize};

/// A student roster entry. The student id doubles as the QR code payload
/// printed on the student's badge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "studentId")]
    pub student_id: String,
    pub name: String,
    #[serde(rename = "className", default)]
    pub class_name: Option<String>,
}

impl Student {
    pub fn class_display(&self) -> &str {
        self.class_name.as_deref().unwrap_or("-")
    }

    /// True when the search query matches the id, name, or class.
    pub fn matches(&self, query: &str) -> bool {
        crate::utils::contains_ignore_case(&self.student_id, query)
            || crate::utils::contains_ignore_case(&self.name, query)
            || self
                .class_name
                .as_deref()
                .map(|c| crate::utils::contains_ignore_case(c, query))
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: &str, name: &str, class: Option<&str>) -> Student {
        Student {
            student_id: id.to_string(),
            name: name.to_string(),
            class_name: class.map(|c| c.to_string()),
        }
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let s = student("1012040015", "Ava Moreno", Some("8B"));
        assert!(s.matches("ava"));
        assert!(s.matches("8b"));
        assert!(s.matches("1012"));
        assert!(!s.matches("zzz"));
    }

    #[test]
    fn test_class_display_falls_back() {
        assert_eq!(student("1", "A", None).class_display(), "-");
        assert_eq!(student("1", "A", Some("7A")).class_display(), "7A");
    }
}
