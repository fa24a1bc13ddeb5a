//! Variant selection.
//!
//! Picks the archive of a release that fits a machine. The machine's raw
//! descriptors are normalized, the release's variants are ordered with
//! [`compare_variants`], and the first variant whose platform and
//! architecture match and whose minimum OS version (if any) is satisfied is
//! chosen.
//!
//! Among macOS archives gated on different minimum versions, the newest
//! requirement the machine satisfies wins: a `10.11.12` machine gets the
//! `osx10.8` build rather than the `osx10.6` one.

use std::cmp::Ordering;

use crate::catalog::{Release, Variant};
use crate::errors::InstallError;
use crate::platform::{normalize_arch, normalize_platform};
use crate::version::VersionNumber;

/// Orders variants for selection.
///
/// Variants are grouped by platform token, ascending. Within a platform,
/// version-gated variants come first ordered by minimum version descending,
/// followed by ungated ones in catalog order (the sort is stable).
#[must_use]
pub fn compare_variants(a: &Variant, b: &Variant) -> Ordering {
    a.os.cmp(&b.os).then_with(|| {
        match (&a.min_os_version, &b.min_os_version) {
            (Some(va), Some(vb)) => VersionNumber::parse(vb).cmp(&VersionNumber::parse(va)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    })
}

/// Returns whether a machine at `os_version` may install `variant`.
///
/// A missing OS version never satisfies a gated variant.
fn satisfies_min_version(variant: &Variant, os_version: Option<&str>) -> bool {
    match (&variant.min_os_version, os_version) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(min), Some(actual)) => VersionNumber::parse(actual) >= VersionNumber::parse(min),
    }
}

/// Selects the variant of `release` to install on a machine.
///
/// `os_name`, `arch` and `os_version` are the raw values reported by the
/// machine, e.g. `"Mac OS X"`, `"x86_64"`, `"10.11.12"`.
///
/// # Errors
///
/// Returns:
/// - [`InstallError::UnsupportedPlatform`] / [`InstallError::UnsupportedArchitecture`]
///   if the machine cannot be normalized
/// - [`InstallError::NoMatchingVariant`] if the release has no suitable archive
pub fn select_variant<'a>(
    release: &'a Release,
    os_name: &str,
    arch: &str,
    os_version: Option<&str>,
) -> Result<&'a Variant, InstallError> {
    let platform = normalize_platform(os_name)?;
    let arch_token = normalize_arch(arch)?;

    let mut candidates: Vec<&Variant> = release.variants().iter().collect();
    candidates.sort_by(|a, b| compare_variants(a, b));

    let selected = candidates.into_iter().find(|v| {
        v.os == platform.as_str()
            && v.arch == arch_token.as_str()
            && satisfies_min_version(v, os_version)
    });

    if let Some(variant) = selected {
        tracing::debug!(
            release = %release.id,
            url = %variant.url,
            os = %platform,
            arch = %arch_token,
            "selected variant"
        );
        return Ok(variant);
    }

    let searched_os = match os_version {
        Some(version) => format!("{os_name} {version}"),
        None => os_name.to_string(),
    };
    Err(InstallError::no_matching_variant(&release.name, searched_os, arch))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(os: &str, arch: &str) -> Variant {
        Variant::new(format!("https://dl.example/go.{os}-{arch}.tar.gz"), os, arch)
    }

    fn osx(arch: &str, min: &str) -> Variant {
        Variant::new(
            format!("https://dl.example/go.darwin-{arch}-osx{min}.tar.gz"),
            "darwin",
            arch,
        )
        .with_min_os_version(min)
    }

    fn release(variants: Vec<Variant>) -> Release {
        Release::new("1.4", "Go 1.4", variants)
    }

    /// A release in the shape Go shipped up to 1.4: separate macOS builds per
    /// minimum version.
    fn full_release() -> Release {
        release(vec![
            pkg("freebsd", "386"),
            pkg("freebsd", "amd64"),
            pkg("linux", "386"),
            pkg("linux", "amd64"),
            pkg("linux", "arm"),
            pkg("linux", "arm64"),
            osx("386", "10.6"),
            osx("amd64", "10.6"),
            osx("386", "10.8"),
            osx("amd64", "10.8"),
        ])
    }

    #[test]
    fn newest_satisfied_osx_build_wins() {
        let release = full_release();
        let selected = select_variant(&release, "Mac OS X", "x86_64", Some("10.11.12"))
            .expect("Should select a variant");
        assert_eq!(selected, &osx("amd64", "10.8"));

        let selected = select_variant(&release, "Mac OS X", "i386", Some("10.11.12"))
            .expect("Should select a variant");
        assert_eq!(selected, &osx("386", "10.8"));
    }

    #[test]
    fn older_osx_gets_earlier_build() {
        let release = full_release();
        let selected = select_variant(&release, "Mac OS X", "x86_64", Some("10.7"))
            .expect("Should select a variant");
        assert_eq!(selected, &osx("amd64", "10.6"));

        let selected = select_variant(&release, "Mac OS X", "i386", Some("10.7"))
            .expect("Should select a variant");
        assert_eq!(selected, &osx("386", "10.6"));
    }

    #[test]
    fn exact_min_version_matches() {
        let release = full_release();
        let selected = select_variant(&release, "Mac OS X", "x86_64", Some("10.6"))
            .expect("Should select a variant");
        assert_eq!(selected, &osx("amd64", "10.6"));
    }

    #[test]
    fn too_old_osx_has_no_variant() {
        let release = full_release();
        let err = select_variant(&release, "Mac OS X", "x86_64", Some("10.5")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Go 1.4 has no installation package for Mac OS X 10.5 (x86_64)"
        );
    }

    #[test]
    fn missing_os_version_never_satisfies_gated_variant() {
        let release = full_release();
        let err = select_variant(&release, "Mac OS X", "x86_64", None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Go 1.4 has no installation package for Mac OS X (x86_64)"
        );
    }

    #[test]
    fn single_ungated_osx_build_is_used() {
        let release = release(vec![
            pkg("linux", "386"),
            pkg("linux", "amd64"),
            pkg("linux", "arm64"),
            pkg("darwin", "amd64"),
        ]);
        let selected = select_variant(&release, "Mac OS X", "x86_64", Some("10.11.12"))
            .expect("Should select a variant");
        assert_eq!(selected, &pkg("darwin", "amd64"));
    }

    #[test]
    fn mixed_gated_and_ungated_osx_builds() {
        // The ungated build is listed first; gated builds still take priority.
        let release = release(vec![
            pkg("darwin", "amd64"),
            osx("amd64", "10.6"),
            osx("amd64", "10.8"),
            pkg("linux", "amd64"),
        ]);

        let selected = select_variant(&release, "Mac OS X", "x86_64", Some("10.9"))
            .expect("Should select a variant");
        assert_eq!(selected, &osx("amd64", "10.8"));

        let selected = select_variant(&release, "Mac OS X", "x86_64", Some("10.7"))
            .expect("Should select a variant");
        assert_eq!(selected, &osx("amd64", "10.6"));

        let selected = select_variant(&release, "Mac OS X", "x86_64", Some("10.5"))
            .expect("Should select a variant");
        assert_eq!(selected, &pkg("darwin", "amd64"));

        let selected = select_variant(&release, "Mac OS X", "x86_64", None)
            .expect("Should select a variant");
        assert_eq!(selected, &pkg("darwin", "amd64"));
    }

    #[test]
    fn ungated_variant_matches_without_os_version() {
        let release = release(vec![pkg("linux", "amd64")]);
        let selected = select_variant(&release, "Linux", "amd64", None)
            .expect("Should select a variant");
        assert_eq!(selected, &pkg("linux", "amd64"));
    }

    #[test]
    fn freebsd_with_release_suffix() {
        let release = full_release();
        let selected = select_variant(&release, "FreeBSD", "amd64", Some("10.2-RELEASE"))
            .expect("Should select a variant");
        assert_eq!(selected, &pkg("freebsd", "amd64"));

        let selected = select_variant(&release, "FreeBSD", "i386", Some("10.2-RELEASE"))
            .expect("Should select a variant");
        assert_eq!(selected, &pkg("freebsd", "386"));
    }

    #[test]
    fn missing_32bit_freebsd_build_fails() {
        let release = release(vec![
            pkg("darwin", "amd64"),
            pkg("freebsd", "amd64"),
            pkg("linux", "386"),
            pkg("linux", "amd64"),
            pkg("linux", "arm64"),
        ]);
        let err = select_variant(&release, "FreeBSD", "i386", Some("10.2-RELEASE")).unwrap_err();
        assert!(matches!(err, InstallError::NoMatchingVariant { .. }));
    }

    #[test]
    fn arm_aliases_select_arm_builds() {
        let release = full_release();
        for arch in ["arm", "aarch32", "armv6l"] {
            let selected = select_variant(&release, "linux", arch, Some("5.4.0"))
                .expect("Should select a variant");
            assert_eq!(selected, &pkg("linux", "arm"), "{arch}");
        }
        for arch in ["aarch64", "arm64"] {
            let selected = select_variant(&release, "linux", arch, Some("5.4.0"))
                .expect("Should select a variant");
            assert_eq!(selected, &pkg("linux", "arm64"), "{arch}");
        }
    }

    #[test]
    fn unsupported_os_fails_before_matching() {
        let release = full_release();
        let err = select_variant(&release, "Android", "armv7a", None).unwrap_err();
        assert!(matches!(err, InstallError::UnsupportedPlatform { .. }));
    }

    #[test]
    fn unsupported_arch_fails_before_matching() {
        let release = full_release();
        let err = select_variant(&release, "Linux", "mips", None).unwrap_err();
        assert!(matches!(err, InstallError::UnsupportedArchitecture { .. }));
    }

    #[test]
    fn duplicates_resolve_to_first_in_catalog_order() {
        let first = Variant::new("https://a.example/go.tar.gz", "linux", "amd64");
        let second = Variant::new("https://b.example/go.tar.gz", "linux", "amd64");
        let release = release(vec![first.clone(), second]);
        let selected = select_variant(&release, "Linux", "x86_64", None)
            .expect("Should select a variant");
        assert_eq!(selected, &first);
    }

    #[test]
    fn selection_is_independent_of_catalog_order() {
        let mut shuffled = full_release();
        shuffled.variants.reverse();
        let selected = select_variant(&shuffled, "Mac OS X", "x86_64", Some("10.11.12"))
            .expect("Should select a variant");
        assert_eq!(selected, &osx("amd64", "10.8"));
    }

    #[test]
    fn comparator_orders_gated_versions_descending() {
        assert_eq!(
            compare_variants(&osx("amd64", "10.8"), &osx("amd64", "10.6")),
            Ordering::Less
        );
        assert_eq!(
            compare_variants(&osx("amd64", "10.6"), &osx("amd64", "10.11")),
            Ordering::Greater
        );
    }

    #[test]
    fn comparator_orders_platforms_ascending() {
        assert_eq!(
            compare_variants(&pkg("darwin", "amd64"), &pkg("linux", "amd64")),
            Ordering::Less
        );
        assert_eq!(
            compare_variants(&pkg("linux", "amd64"), &pkg("linux", "386")),
            Ordering::Equal
        );
    }

    #[test]
    fn comparator_puts_gated_before_ungated() {
        assert_eq!(
            compare_variants(&osx("amd64", "10.6"), &pkg("darwin", "amd64")),
            Ordering::Less
        );
        assert_eq!(
            compare_variants(&pkg("darwin", "amd64"), &osx("amd64", "10.6")),
            Ordering::Greater
        );
    }
}
