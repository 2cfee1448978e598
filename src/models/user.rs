use serde::{Deserialize, Serialize};

/// A rater with demographic attributes from `users.dat`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub user_id: u32,
    pub gender: String,
    /// Raw age bracket code
    pub age: u32,
    pub age_desc: Option<String>,
    /// Raw occupation code
    pub occupation: u32,
    pub occupation_desc: Option<String>,
    pub zip_code: String,
}

impl User {
    /// Creates a user, resolving the age and occupation codes to descriptions
    pub fn new(user_id: u32, gender: String, age: u32, occupation: u32, zip_code: String) -> Self {
        Self {
            user_id,
            gender,
            age,
            age_desc: age_description(age).map(str::to_string),
            occupation,
            occupation_desc: occupation_description(occupation).map(str::to_string),
            zip_code,
        }
    }
}

/// Maps a MovieLens age code to its bracket label
pub fn age_description(code: u32) -> Option<&'static str> {
    match code {
        1 => Some("Under 18"),
        18 => Some("18-24"),
        25 => Some("25-34"),
        35 => Some("35-44"),
        45 => Some("45-49"),
        50 => Some("50-55"),
        56 => Some("56+"),
        _ => None,
    }
}

const OCCUPATIONS: [&str; 21] = [
    "other",
    "academic/educator",
    "artist",
    "clerical/admin",
    "college/grad student",
    "customer service",
    "doctor/health care",
    "executive/managerial",
    "farmer",
    "homemaker",
    "K-12 student",
    "lawyer",
    "programmer",
    "retired",
    "sales/marketing",
    "scientist",
    "self-employed",
    "technician/engineer",
    "tradesman/craftsman",
    "unemployed",
    "writer",
];

/// Maps a MovieLens occupation code to its label
pub fn occupation_description(code: u32) -> Option<&'static str> {
    OCCUPATIONS.get(code as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_codes() {
        assert_eq!(age_description(1), Some("Under 18"));
        assert_eq!(age_description(56), Some("56+"));
        assert_eq!(age_description(30), None);
    }

    #[test]
    fn test_occupation_codes() {
        assert_eq!(occupation_description(0), Some("other"));
        assert_eq!(occupation_description(12), Some("programmer"));
        assert_eq!(occupation_description(20), Some("writer"));
        assert_eq!(occupation_description(21), None);
    }

    #[test]
    fn test_new_user_with_unknown_codes() {
        let user = User::new(42, "F".to_string(), 99, 77, "02139".to_string());
        assert_eq!(user.age_desc, None);
        assert_eq!(user.occupation_desc, None);
        assert_eq!(user.age, 99);
    }

    #[test]
    fn test_new_user_resolves_codes() {
        let user = User::new(1, "F".to_string(), 1, 10, "48067".to_string());
        assert_eq!(user.age_desc.as_deref(), Some("Under 18"));
        assert_eq!(user.occupation_desc.as_deref(), Some("K-12 student"));
    }
}
