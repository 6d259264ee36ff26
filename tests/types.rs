// ABOUTME: Integration tests for type-safe identifiers and validated types.
// ABOUTME: Tests parsing, validation, and naming derived from PRs and repositories.

use ephemera::types::*;

fn pr(n: u64) -> PrNumber {
    PrNumber::new(n).unwrap()
}

mod pr_number_tests {
    use super::*;

    #[test]
    fn parses_plain_and_hash_prefixed() {
        assert_eq!("42".parse::<PrNumber>().unwrap().get(), 42);
        assert_eq!("#42".parse::<PrNumber>().unwrap().get(), 42);
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert_eq!("0".parse::<PrNumber>(), Err(PrNumberError::Zero));
        assert!(matches!(
            "forty-two".parse::<PrNumber>(),
            Err(PrNumberError::Invalid(_))
        ));
        assert!(PrNumber::try_from(0u64).is_err());
    }

    #[test]
    fn tag_is_shared_by_images_and_namespaces() {
        assert_eq!(pr(7).tag(), "pr-7");
        assert_eq!(NamespaceName::for_pr(pr(7), 0).as_str(), pr(7).tag());
    }
}

mod namespace_tests {
    use super::*;

    #[test]
    fn base_and_suffixed_names() {
        assert_eq!(NamespaceName::for_pr(pr(42), 0).as_str(), "pr-42");
        assert_eq!(NamespaceName::for_pr(pr(42), 3).as_str(), "pr-42-3");
    }

    #[test]
    fn parse_recovers_pr_and_suffix() {
        let ns = NamespaceName::parse("pr-42-3").unwrap();
        assert_eq!(ns.pr_number(), pr(42));
        assert_eq!(ns.suffix(), 3);

        let base = NamespaceName::parse("pr-42").unwrap();
        assert_eq!(base.suffix(), 0);
    }

    #[test]
    fn rejects_non_preview_names() {
        for name in [
            "default",
            "pr-",
            "pr-0",
            "pr-042",
            "pr-42-0",
            "pr-42-x",
            "pr-42-1-2",
            "PR-42",
        ] {
            assert!(NamespaceName::parse(name).is_err(), "{name} accepted");
        }
    }

    #[test]
    fn prefix_of_another_pr_does_not_match() {
        assert!(NamespaceName::matches_pr("pr-42", pr(42)));
        assert!(NamespaceName::matches_pr("pr-42-17", pr(42)));
        assert!(!NamespaceName::matches_pr("pr-420", pr(42)));
        assert!(!NamespaceName::matches_pr("pr-4", pr(42)));
        assert!(!NamespaceName::matches_pr("pr-42-staging", pr(42)));
        assert!(!NamespaceName::matches_pr("foo-pr-42", pr(42)));
    }
}

mod app_name_tests {
    use super::*;

    #[test]
    fn accepts_lowercase_dns_labels() {
        assert_eq!(AppName::new("shop-api").unwrap().as_str(), "shop-api");
    }

    #[test]
    fn rejects_invalid_names() {
        assert_eq!(AppName::new(""), Err(AppNameError::Empty));
        assert_eq!(AppName::new("-shop"), Err(AppNameError::EdgeHyphen));
        assert_eq!(AppName::new("Shop"), Err(AppNameError::InvalidChar('S')));
    }

    #[test]
    fn derived_from_repository_name() {
        let repo = RepoSlug::parse("Acme/My_Web.App").unwrap();
        assert_eq!(AppName::from_repository(&repo).as_str(), "my-web-app");

        let odd = RepoSlug::parse("acme/__").unwrap();
        assert_eq!(AppName::from_repository(&odd).as_str(), "app");
    }
}

mod repo_slug_tests {
    use super::*;

    #[test]
    fn parses_urls_and_slugs() {
        for input in [
            "https://github.com/Acme/Shop.git",
            "http://git.example.com/Acme/Shop/",
            "git@github.com:Acme/Shop.git",
            "Acme/Shop",
        ] {
            let slug = RepoSlug::from_url(input).unwrap();
            assert_eq!(slug.owner(), "Acme", "{input}");
            assert_eq!(slug.name(), "Shop", "{input}");
        }
    }

    #[test]
    fn flattened_is_lowercase() {
        let slug = RepoSlug::parse("Acme/Shop").unwrap();
        assert_eq!(slug.flattened(), "acme-shop");
        assert_eq!(slug.to_string(), "Acme/Shop");
    }

    #[test]
    fn rejects_malformed_slugs() {
        assert!(matches!(
            RepoSlug::parse("shop"),
            Err(RepoSlugError::InvalidFormat(_))
        ));
        assert!(RepoSlug::parse("acme/shop/extra").is_err());
        assert_eq!(
            RepoSlug::parse("acme/sh op"),
            Err(RepoSlugError::InvalidChar(' '))
        );
        assert!(RepoSlug::from_url("https://github.com").is_err());
    }
}

mod image_ref_tests {
    use super::*;

    #[test]
    fn untagged_defaults_to_latest() {
        let img = ImageRef::parse("nginx").unwrap();
        assert_eq!(img.repository(), "nginx");
        assert_eq!(img.tag(), "latest");
    }

    #[test]
    fn registry_port_and_tag() {
        let img = ImageRef::parse("localhost:5000/previews/acme-shop:pr-9").unwrap();
        assert_eq!(img.repository(), "localhost:5000/previews/acme-shop");
        assert_eq!(img.tag(), "pr-9");
        assert_eq!(img.to_string(), "localhost:5000/previews/acme-shop:pr-9");
    }

    #[test]
    fn rejects_empty_and_malformed() {
        assert_eq!(ImageRef::parse("  "), Err(ParseImageRefError::Empty));
        assert!(matches!(
            ImageRef::parse("app:"),
            Err(ParseImageRefError::InvalidFormat(_))
        ));
        assert!(matches!(
            ImageRef::parse(":tag"),
            Err(ParseImageRefError::InvalidFormat(_))
        ));
    }

    #[test]
    fn preview_reference_is_canonical() {
        let repo = RepoSlug::parse("Acme/Shop").unwrap();
        let generic = ImageRef::preview("ghcr.io/acme", &repo, None, pr(12));
        let backend = ImageRef::preview("ghcr.io/acme", &repo, Some("Backend"), pr(12));

        assert_eq!(generic.to_string(), "ghcr.io/acme/acme-shop:pr-12");
        assert_eq!(backend.to_string(), "ghcr.io/acme/acme-shop-backend:pr-12");
        assert_eq!(ImageRef::parse(&backend.to_string()).unwrap(), backend);
    }
}
