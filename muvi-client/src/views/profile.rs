//! Profile view (`/profile`)

use crate::identity::IdentityUser;

pub fn render(user: &IdentityUser) -> String {
    let mut lines = vec![format!("Username: {}", user.username)];
    if let Some(email) = user.attribute("email") {
        let verified = match user.attribute("email_verified") {
            Some("true") => " (verified)",
            _ => "",
        };
        lines.push(format!("Email: {}{}", email, verified));
    }
    if let Some(sub) = user.attribute("sub") {
        lines.push(format!("User ID: {}", sub));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_profile() {
        let user = IdentityUser {
            username: "u-1".to_string(),
            attributes: [
                ("email".to_string(), "a@b.c".to_string()),
                ("email_verified".to_string(), "true".to_string()),
                ("sub".to_string(), "u-1".to_string()),
            ]
            .into_iter()
            .collect(),
        };
        assert_eq!(
            render(&user),
            "Username: u-1\nEmail: a@b.c (verified)\nUser ID: u-1"
        );
    }
}
