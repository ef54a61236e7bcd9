use serde::{Deserialize, Serialize};

use crate::pass::{Enhancement, Pass};

/// Position of the active pass and enhancement within the catalog.
///
/// The catalog is immutable for the whole session, so indices stay valid for
/// as long as the selection lives. Every function here returns the input
/// selection unchanged when a move is not possible, so callers can compare
/// old and new to see whether anything happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub pass: usize,
    pub enhancement: usize,
}

impl Selection {
    /// The selected pass, if the index is still in range
    pub fn selected_pass<'a>(&self, catalog: &'a [Pass]) -> Option<&'a Pass> {
        catalog.get(self.pass)
    }

    /// The selected enhancement, if both indices are still in range
    pub fn selected_enhancement<'a>(&self, catalog: &'a [Pass]) -> Option<&'a Enhancement> {
        self.selected_pass(catalog)?.enhancements.get(self.enhancement)
    }
}

/// The pass identity and enhancement triple a permalink points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermalinkTarget {
    pub start: String,
    pub end: String,
    pub satellite: String,
    pub enhancement: Enhancement,
}

/// Default selection: the most recent pass with its default enhancement
pub fn default_selection(catalog: &[Pass]) -> Option<Selection> {
    if catalog.is_empty() {
        return None;
    }

    let pass = catalog.len() - 1;
    Some(Selection {
        pass,
        enhancement: default_enhancement(&catalog[pass]),
    })
}

/// First msa entry if the pass has one, else the first enhancement
fn default_enhancement(pass: &Pass) -> usize {
    pass.enhancements
        .iter()
        .position(|e| e.kind == "msa")
        .unwrap_or(0)
}

/// Deep-link form of a selection: `/{start}/{end}/{satellite}/{kind}` with
/// `precip=true`/`map=true` query flags appended in that order when set
pub fn encode_permalink(catalog: &[Pass], selection: Selection) -> String {
    let (pass, enhancement) = match (
        selection.selected_pass(catalog),
        selection.selected_enhancement(catalog),
    ) {
        (Some(pass), Some(enhancement)) => (pass, enhancement),
        _ => return "/".to_string(),
    };

    let mut link = format!(
        "/{}/{}/{}/{}",
        pass.start, pass.end, pass.satellite, enhancement.kind
    );

    let mut flags = Vec::new();
    if enhancement.precip {
        flags.push("precip=true");
    }
    if enhancement.map {
        flags.push("map=true");
    }
    if !flags.is_empty() {
        link.push('?');
        link.push_str(&flags.join("&"));
    }

    link
}

/// Split a permalink into the pass identity and enhancement triple it points
/// at. Returns None unless the path has the expected four segments.
pub fn decode_permalink(link: &str) -> Option<PermalinkTarget> {
    let (path, query) = match link.split_once('?') {
        Some((path, query)) => (path, query),
        None => (link, ""),
    };

    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() != 5 || !segments[0].is_empty() {
        return None;
    }

    Some(PermalinkTarget {
        start: segments[1].to_string(),
        end: segments[2].to_string(),
        satellite: segments[3].to_string(),
        enhancement: Enhancement {
            kind: segments[4].to_string(),
            precip: query_flag(query, "precip"),
            map: query_flag(query, "map"),
        },
    })
}

/// Value of the first `name=...` query pair, compared against "true"
fn query_flag(query: &str, name: &str) -> bool {
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')) {
            return value == "true";
        }
    }
    false
}

/// Resolve a decoded permalink against the catalog. Falls back one level at
/// a time: an unknown pass becomes the default pass, an unknown enhancement
/// becomes the default enhancement of whichever pass was resolved. Only an
/// empty catalog yields no selection.
pub fn resolve_target(catalog: &[Pass], target: &PermalinkTarget) -> Option<Selection> {
    if catalog.is_empty() {
        return None;
    }

    let pass = catalog
        .iter()
        .position(|p| p.matches(&target.start, &target.end, &target.satellite))
        .unwrap_or(catalog.len() - 1);

    let enhancement = catalog[pass]
        .enhancements
        .iter()
        .position(|e| *e == target.enhancement)
        .unwrap_or_else(|| default_enhancement(&catalog[pass]));

    Some(Selection { pass, enhancement })
}

/// Resolve a permalink string; anything unparseable degrades to the default
/// selection
pub fn resolve_permalink(catalog: &[Pass], link: &str) -> Option<Selection> {
    match decode_permalink(link) {
        Some(target) => resolve_target(catalog, &target),
        None => default_selection(catalog),
    }
}

/// Step to the previous (-1) or next (+1) pass; a no-op at either boundary
pub fn navigate_pass(catalog: &[Pass], selection: Selection, direction: i32) -> Selection {
    let target = selection.pass as i64 + direction as i64;
    if target < 0 || target >= catalog.len() as i64 {
        return selection;
    }

    change_pass(catalog, selection, target as usize)
}

/// Move to the given pass, keeping the current enhancement triple when the
/// new pass has it and falling back to its first enhancement otherwise
pub fn change_pass(catalog: &[Pass], selection: Selection, pass: usize) -> Selection {
    let current = match selection.selected_enhancement(catalog) {
        Some(enhancement) => enhancement,
        None => return selection,
    };
    let next = match catalog.get(pass) {
        Some(next) => next,
        None => return selection,
    };

    let enhancement = next
        .enhancements
        .iter()
        .position(|e| e == current)
        .unwrap_or(0);

    Selection { pass, enhancement }
}

/// Step to the previous (-1) or next (+1) enhancement kind within the
/// current pass, skipping same-kind variants. A no-op when the scan runs off
/// either end of the list.
pub fn navigate_enhancement(catalog: &[Pass], selection: Selection, direction: i32) -> Selection {
    let pass = match selection.selected_pass(catalog) {
        Some(pass) => pass,
        None => return selection,
    };
    let current = match pass.enhancements.get(selection.enhancement) {
        Some(enhancement) => enhancement,
        None => return selection,
    };

    let mut index = selection.enhancement as i64;
    loop {
        index += direction as i64;
        if index < 0 || index >= pass.enhancements.len() as i64 {
            return selection;
        }
        if pass.enhancements[index as usize].kind != current.kind {
            break;
        }
    }

    select_kind(catalog, selection, &pass.enhancements[index as usize].kind)
}

/// Select the best variant of the given kind on the current pass: matching
/// flags first, then matching map, then matching precip, then the first of
/// that kind. A no-op when the pass has no variant of that kind.
pub fn select_kind(catalog: &[Pass], selection: Selection, kind: &str) -> Selection {
    let pass = match selection.selected_pass(catalog) {
        Some(pass) => pass,
        None => return selection,
    };
    let current = match pass.enhancements.get(selection.enhancement) {
        Some(enhancement) => enhancement,
        None => return selection,
    };

    let variants = &pass.enhancements;
    let found = variants
        .iter()
        .position(|e| e.kind == kind && e.map == current.map && e.precip == current.precip)
        .or_else(|| variants.iter().position(|e| e.kind == kind && e.map == current.map))
        .or_else(|| variants.iter().position(|e| e.kind == kind && e.precip == current.precip))
        .or_else(|| variants.iter().position(|e| e.kind == kind));

    match found {
        Some(enhancement) => Selection {
            pass: selection.pass,
            enhancement,
        },
        None => selection,
    }
}

/// Switch to the same-kind sibling with the opposite precip flag; a no-op
/// when no such sibling exists
pub fn toggle_precip(catalog: &[Pass], selection: Selection) -> Selection {
    let pass = match selection.selected_pass(catalog) {
        Some(pass) => pass,
        None => return selection,
    };
    let current = match pass.enhancements.get(selection.enhancement) {
        Some(enhancement) => enhancement,
        None => return selection,
    };

    let sibling = pass.enhancements.iter().position(|e| {
        e.kind == current.kind && e.precip != current.precip && e.map == current.map
    });

    match sibling {
        Some(enhancement) => Selection {
            pass: selection.pass,
            enhancement,
        },
        None => selection,
    }
}

/// Switch to the same-kind sibling with the opposite map flag; a no-op when
/// no such sibling exists
pub fn toggle_map(catalog: &[Pass], selection: Selection) -> Selection {
    let pass = match selection.selected_pass(catalog) {
        Some(pass) => pass,
        None => return selection,
    };
    let current = match pass.enhancements.get(selection.enhancement) {
        Some(enhancement) => enhancement,
        None => return selection,
    };

    let sibling = pass.enhancements.iter().position(|e| {
        e.kind == current.kind && e.map != current.map && e.precip == current.precip
    });

    match sibling {
        Some(enhancement) => Selection {
            pass: selection.pass,
            enhancement,
        },
        None => selection,
    }
}

/// True when toggling precip on the current selection would land somewhere
pub fn can_toggle_precip(catalog: &[Pass], selection: Selection) -> bool {
    toggle_precip(catalog, selection) != selection
}

/// True when toggling map on the current selection would land somewhere
pub fn can_toggle_map(catalog: &[Pass], selection: Selection) -> bool {
    toggle_map(catalog, selection) != selection
}

/// Image loads worth issuing after a selection change.
///
/// When the selection moved at all, the new enhancement triple is planned
/// for the passes at offsets -1, +1, -2, +2 around the new position
/// (skipping offsets past either end). When the pass changed or the
/// enhancement kind changed, every same-kind sibling on the new pass is
/// planned as well, so flag toggles become instant. Entries come back as
/// (catalog index, enhancement) pairs in issue order.
pub fn prefetch_plan(
    catalog: &[Pass],
    old: Option<Selection>,
    new: Selection,
) -> Vec<(usize, Enhancement)> {
    let mut plan = Vec::new();

    let pass = match new.selected_pass(catalog) {
        Some(pass) => pass,
        None => return plan,
    };
    let enhancement = match new.selected_enhancement(catalog) {
        Some(enhancement) => enhancement,
        None => return plan,
    };

    let selection_changed = old.map(|o| o != new).unwrap_or(true);
    let pass_changed = old.map(|o| o.pass != new.pass).unwrap_or(true);
    let kind_changed = match old.and_then(|o| o.selected_enhancement(catalog)) {
        Some(previous) => previous.kind != enhancement.kind,
        None => false,
    };

    if selection_changed {
        for distance in 1..=2 {
            if new.pass >= distance {
                plan.push((new.pass - distance, enhancement.clone()));
            }
            if new.pass + distance < catalog.len() {
                plan.push((new.pass + distance, enhancement.clone()));
            }
        }
    }

    if pass_changed || kind_changed {
        for (index, sibling) in pass.enhancements.iter().enumerate() {
            if index != new.enhancement && sibling.kind == enhancement.kind {
                plan.push((new.pass, sibling.clone()));
            }
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::parse_pass_list;

    fn enhancement(kind: &str, precip: bool, map: bool) -> Enhancement {
        Enhancement {
            kind: kind.to_string(),
            precip,
            map,
        }
    }

    // After parsing and ordering:
    //   [0] noaa-19: [mcir, msa-precip-map]
    //   [1] noaa-18: [hvct, mcir-precip, msa, msa-precip, msa-precip-map]
    //   [2] noaa-15: [mcir, mcir-map, therm]
    fn catalog() -> Vec<Pass> {
        parse_pass_list(
            "20230103000000 20230103001500 noaa-15 mcir mcir-map therm\n\
             20230101000000 20230101001500 noaa-19 mcir msa-precip-map\n\
             20230102000000 20230102001500 noaa-18 hvct msa msa-precip msa-precip-map mcir-precip\n",
        )
    }

    fn selected(catalog: &[Pass], selection: Selection) -> Enhancement {
        selection.selected_enhancement(catalog).unwrap().clone()
    }

    #[test]
    fn test_fixture_shape() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog[1].enhancements,
            vec![
                enhancement("hvct", false, false),
                enhancement("mcir", true, false),
                enhancement("msa", false, false),
                enhancement("msa", true, false),
                enhancement("msa", true, true),
            ]
        );
    }

    #[test]
    fn test_default_selection() {
        let catalog = catalog();

        // Most recent pass; noaa-15 has no msa, so its first enhancement.
        assert_eq!(
            default_selection(&catalog),
            Some(Selection { pass: 2, enhancement: 0 })
        );

        assert_eq!(default_selection(&[]), None);
    }

    #[test]
    fn test_default_selection_prefers_msa() {
        let catalog = parse_pass_list("20230101000000 20230101001500 noaa-18 hvct msa-precip msa\n");

        let selection = default_selection(&catalog).unwrap();
        assert_eq!(selection.enhancement, 1);
        assert_eq!(selected(&catalog, selection), enhancement("msa", true, false));
    }

    #[test]
    fn test_encode_permalink() {
        let catalog = catalog();

        assert_eq!(
            encode_permalink(&catalog, Selection { pass: 0, enhancement: 0 }),
            "/20230101000000/20230101001500/noaa-19/mcir"
        );
        assert_eq!(
            encode_permalink(&catalog, Selection { pass: 0, enhancement: 1 }),
            "/20230101000000/20230101001500/noaa-19/msa?precip=true&map=true"
        );
        assert_eq!(
            encode_permalink(&catalog, Selection { pass: 1, enhancement: 3 }),
            "/20230102000000/20230102001500/noaa-18/msa?precip=true"
        );
        assert_eq!(
            encode_permalink(&catalog, Selection { pass: 2, enhancement: 1 }),
            "/20230103000000/20230103001500/noaa-15/mcir?map=true"
        );
    }

    #[test]
    fn test_permalink_round_trip() {
        let catalog = catalog();

        for pass in 0..catalog.len() {
            for enhancement in 0..catalog[pass].enhancements.len() {
                let selection = Selection { pass, enhancement };
                let link = encode_permalink(&catalog, selection);
                assert_eq!(resolve_permalink(&catalog, &link), Some(selection));
            }
        }
    }

    #[test]
    fn test_decode_permalink() {
        let target = decode_permalink("/20230101000000/20230101001500/noaa-19/msa?precip=true").unwrap();
        assert_eq!(target.start, "20230101000000");
        assert_eq!(target.end, "20230101001500");
        assert_eq!(target.satellite, "noaa-19");
        assert_eq!(target.enhancement, enhancement("msa", true, false));

        // Flags count only when exactly "true".
        let target = decode_permalink("/a/b/c/msa?precip=yes&map=true").unwrap();
        assert_eq!(target.enhancement, enhancement("msa", false, true));

        assert!(decode_permalink("/too/short/path").is_none());
        assert!(decode_permalink("/one/two/three/four/five").is_none());
        assert!(decode_permalink("no-leading-slash/a/b/c").is_none());
        assert!(decode_permalink("").is_none());
    }

    #[test]
    fn test_resolve_falls_back_to_default_enhancement() {
        let catalog = catalog();

        // (msa, precip, no map) does not exist on noaa-19; the default rule
        // picks the first msa entry instead.
        let selection =
            resolve_permalink(&catalog, "/20230101000000/20230101001500/noaa-19/msa?precip=true");
        assert_eq!(selection, Some(Selection { pass: 0, enhancement: 1 }));
        assert_eq!(
            selected(&catalog, selection.unwrap()),
            enhancement("msa", true, true)
        );
    }

    #[test]
    fn test_resolve_falls_back_to_default_pass() {
        let catalog = catalog();

        // Unknown pass identity degrades to the most recent pass, and the
        // requested enhancement is looked up there.
        let selection =
            resolve_permalink(&catalog, "/19990101000000/19990101000100/noaa-12/therm");
        assert_eq!(selection, Some(Selection { pass: 2, enhancement: 2 }));

        // Unknown pass and unknown enhancement fall all the way through.
        let selection = resolve_permalink(&catalog, "/19990101000000/19990101000100/noaa-12/msa");
        assert_eq!(selection, Some(Selection { pass: 2, enhancement: 0 }));
    }

    #[test]
    fn test_resolve_unparseable_link_uses_defaults() {
        let catalog = catalog();

        assert_eq!(resolve_permalink(&catalog, "/"), default_selection(&catalog));
        assert_eq!(resolve_permalink(&catalog, "garbage"), default_selection(&catalog));
        assert_eq!(resolve_permalink(&[], "/a/b/c/d"), None);
    }

    #[test]
    fn test_pass_navigation_boundaries() {
        let catalog = catalog();

        let first = Selection { pass: 0, enhancement: 0 };
        assert_eq!(navigate_pass(&catalog, first, -1), first);
        // Repeated attempts stay put.
        let again = navigate_pass(&catalog, navigate_pass(&catalog, first, -1), -1);
        assert_eq!(again, first);

        let last = Selection { pass: 2, enhancement: 1 };
        assert_eq!(navigate_pass(&catalog, last, 1), last);
    }

    #[test]
    fn test_pass_navigation_preserves_enhancement_triple() {
        let catalog = catalog();

        // (msa, precip, map) exists on both noaa-18 and noaa-19.
        let selection = Selection { pass: 1, enhancement: 4 };
        let moved = navigate_pass(&catalog, selection, -1);
        assert_eq!(moved, Selection { pass: 0, enhancement: 1 });
        assert_eq!(selected(&catalog, moved), enhancement("msa", true, true));

        // (mcir, precip, no map) has no match on noaa-15; first enhancement.
        let selection = Selection { pass: 1, enhancement: 1 };
        let moved = navigate_pass(&catalog, selection, 1);
        assert_eq!(moved, Selection { pass: 2, enhancement: 0 });
    }

    #[test]
    fn test_enhancement_navigation_scans_to_next_kind() {
        let catalog = catalog();

        // mcir -> msa on noaa-19; flags do not match anywhere, so the first
        // msa variant wins.
        let selection = Selection { pass: 0, enhancement: 0 };
        let moved = navigate_enhancement(&catalog, selection, 1);
        assert_eq!(moved, Selection { pass: 0, enhancement: 1 });
        assert_eq!(selected(&catalog, moved), enhancement("msa", true, true));

        // Same-kind variants are skipped: from the last msa on noaa-18 the
        // backward scan crosses two msa entries before landing on mcir.
        let selection = Selection { pass: 1, enhancement: 4 };
        let moved = navigate_enhancement(&catalog, selection, -1);
        assert_eq!(moved, Selection { pass: 1, enhancement: 1 });
    }

    #[test]
    fn test_enhancement_navigation_has_no_wraparound() {
        let catalog = catalog();

        let selection = Selection { pass: 0, enhancement: 0 };
        assert_eq!(navigate_enhancement(&catalog, selection, -1), selection);

        let selection = Selection { pass: 0, enhancement: 1 };
        assert_eq!(navigate_enhancement(&catalog, selection, 1), selection);
    }

    #[test]
    fn test_select_kind_variant_preference() {
        let catalog = catalog();

        // Exact flag match.
        let selection = Selection { pass: 1, enhancement: 0 };
        assert_eq!(
            select_kind(&catalog, selection, "msa"),
            Selection { pass: 1, enhancement: 2 }
        );

        // No exact match for (no precip, no map); same map wins over first.
        assert_eq!(
            select_kind(&catalog, selection, "mcir"),
            Selection { pass: 1, enhancement: 1 }
        );

        // Same precip beats first-of-kind: current (msa, precip, map) has no
        // exact or same-map mcir variant, but mcir-precip shares the flag.
        let selection = Selection { pass: 1, enhancement: 4 };
        assert_eq!(
            select_kind(&catalog, selection, "mcir"),
            Selection { pass: 1, enhancement: 1 }
        );

        // Unknown kind is a no-op.
        assert_eq!(select_kind(&catalog, selection, "hvc"), selection);
    }

    #[test]
    fn test_toggle_precip() {
        let catalog = catalog();

        let selection = Selection { pass: 1, enhancement: 2 };
        let toggled = toggle_precip(&catalog, selection);
        assert_eq!(toggled, Selection { pass: 1, enhancement: 3 });
        assert_eq!(toggle_precip(&catalog, toggled), selection);

        // (msa, no precip, map) does not exist, so the fully flagged variant
        // cannot drop precip.
        let selection = Selection { pass: 1, enhancement: 4 };
        assert_eq!(toggle_precip(&catalog, selection), selection);
        assert!(!can_toggle_precip(&catalog, selection));
    }

    #[test]
    fn test_toggle_map_without_sibling_is_a_no_op() {
        let catalog = catalog();

        // No (mcir, no precip, map) on noaa-19.
        let selection = Selection { pass: 0, enhancement: 0 };
        assert_eq!(toggle_map(&catalog, selection), selection);
        assert!(!can_toggle_map(&catalog, selection));

        // noaa-15 has both mcir variants.
        let selection = Selection { pass: 2, enhancement: 0 };
        let toggled = toggle_map(&catalog, selection);
        assert_eq!(toggled, Selection { pass: 2, enhancement: 1 });
        assert!(can_toggle_map(&catalog, toggled));
    }

    #[test]
    fn test_prefetch_plan_initial_load() {
        let catalog = catalog();

        let new = Selection { pass: 1, enhancement: 2 };
        let plan = prefetch_plan(&catalog, None, new);
        assert_eq!(
            plan,
            vec![
                (0, enhancement("msa", false, false)),
                (2, enhancement("msa", false, false)),
                (1, enhancement("msa", true, false)),
                (1, enhancement("msa", true, true)),
            ]
        );
    }

    #[test]
    fn test_prefetch_plan_flag_toggle_skips_siblings() {
        let catalog = catalog();

        // Same pass, same kind: neighbours only.
        let old = Selection { pass: 1, enhancement: 2 };
        let new = Selection { pass: 1, enhancement: 3 };
        let plan = prefetch_plan(&catalog, Some(old), new);
        assert_eq!(
            plan,
            vec![
                (0, enhancement("msa", true, false)),
                (2, enhancement("msa", true, false)),
            ]
        );
    }

    #[test]
    fn test_prefetch_plan_pass_change() {
        let catalog = catalog();

        let old = Selection { pass: 1, enhancement: 4 };
        let new = navigate_pass(&catalog, old, 1);
        assert_eq!(new, Selection { pass: 2, enhancement: 0 });

        let plan = prefetch_plan(&catalog, Some(old), new);
        assert_eq!(
            plan,
            vec![
                (1, enhancement("mcir", false, false)),
                (0, enhancement("mcir", false, false)),
                (2, enhancement("mcir", false, true)),
            ]
        );
    }

    #[test]
    fn test_prefetch_plan_unchanged_selection_is_empty() {
        let catalog = catalog();

        let selection = Selection { pass: 1, enhancement: 2 };
        assert!(prefetch_plan(&catalog, Some(selection), selection).is_empty());
    }

    #[test]
    fn test_every_operation_keeps_selection_valid() {
        let catalog = catalog();

        let mut reached = Vec::new();
        for pass in 0..catalog.len() {
            for enhancement in 0..catalog[pass].enhancements.len() {
                let start = Selection { pass, enhancement };
                reached.push(navigate_pass(&catalog, start, -1));
                reached.push(navigate_pass(&catalog, start, 1));
                reached.push(navigate_enhancement(&catalog, start, -1));
                reached.push(navigate_enhancement(&catalog, start, 1));
                reached.push(toggle_precip(&catalog, start));
                reached.push(toggle_map(&catalog, start));
            }
        }

        for selection in reached {
            let enhancement = selection.selected_enhancement(&catalog).unwrap();
            assert!(catalog[selection.pass].enhancements.contains(enhancement));
        }
    }
}
