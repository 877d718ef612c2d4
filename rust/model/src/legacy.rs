// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Legacy subtype registry.
//!
//! IFC2x3/IFC4 carried `StandardCase`/`ElementedCase` subtypes (and a few
//! other deprecated entities) that later schema versions folded into their
//! base types. Queries for a base type must also return instances written
//! with the legacy tags, so older files behave like current ones.

/// Legacy subtype tags (uppercase) returned by a query for the given base
/// type tag (uppercase). Empty for types without legacy variants.
pub fn legacy_subtypes(base_type: &str) -> &'static [&'static str] {
    match base_type {
        "IFCWALL" => &["IFCWALLSTANDARDCASE", "IFCWALLELEMENTEDCASE"],
        "IFCSLAB" => &["IFCSLABSTANDARDCASE", "IFCSLABELEMENTEDCASE"],
        "IFCBEAM" => &["IFCBEAMSTANDARDCASE"],
        "IFCCOLUMN" => &["IFCCOLUMNSTANDARDCASE"],
        "IFCMEMBER" => &["IFCMEMBERSTANDARDCASE"],
        "IFCPLATE" => &["IFCPLATESTANDARDCASE"],
        "IFCDOOR" => &["IFCDOORSTANDARDCASE"],
        "IFCWINDOW" => &["IFCWINDOWSTANDARDCASE"],
        "IFCOPENINGELEMENT" => &["IFCOPENINGSTANDARDCASE"],
        "IFCBUILDINGELEMENTPROXY" => &["IFCPROXY"],
        "IFCFURNISHINGELEMENT" => &["IFCFURNITURE", "IFCSYSTEMFURNITUREELEMENT"],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_subtypes() {
        assert_eq!(
            legacy_subtypes("IFCWALL"),
            &["IFCWALLSTANDARDCASE", "IFCWALLELEMENTEDCASE"]
        );
        assert!(legacy_subtypes("IFCROOF").is_empty());
    }
}
