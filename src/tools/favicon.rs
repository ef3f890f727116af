// src/tools/favicon.rs

// Guess a domain from a record's display name: lowercase, drop
// whitespace and anything outside [A-Za-z0-9_.-], append ".com"
fn derive_domain(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    format!("{}.com", cleaned)
}

/// Favicon URL for a credential record's display name.
pub fn favicon_url(name: &str) -> String {
    format!(
        "https://www.google.com/s2/favicons?sz=64&domain={}",
        derive_domain(name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_mangled_into_domains() {
        assert_eq!(derive_domain("GitHub"), "github.com");
        assert_eq!(derive_domain("My Bank"), "mybank.com");
        assert_eq!(derive_domain("Café & Co!"), "cafco.com");
        assert_eq!(derive_domain("self-hosted_wiki"), "self-hosted_wiki.com");
        assert_eq!(derive_domain(""), ".com");
    }

    #[test]
    fn url_embeds_the_derived_domain() {
        assert_eq!(
            favicon_url("My Bank"),
            "https://www.google.com/s2/favicons?sz=64&domain=mybank.com"
        );
    }
}
