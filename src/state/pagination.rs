// ============================================================================
// PAGINACIÓN - Controles de página y etiqueta de rango
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageControlKind {
    Previous,
    Next,
    Page(u32),
    Ellipsis,
}

/// Un botón del paginador
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageControl {
    pub kind: PageControlKind,
    /// Página a la que lleva (None para la elipsis)
    pub target: Option<u32>,
    pub disabled: bool,
    pub active: bool,
}

impl PageControl {
    fn page(page: u32, current: u32) -> Self {
        Self {
            kind: PageControlKind::Page(page),
            target: Some(page),
            disabled: false,
            active: page == current,
        }
    }

    fn ellipsis() -> Self {
        Self { kind: PageControlKind::Ellipsis, target: None, disabled: true, active: false }
    }

    pub fn label(&self) -> String {
        match self.kind {
            PageControlKind::Previous => "Previous".to_string(),
            PageControlKind::Next => "Next".to_string(),
            PageControlKind::Page(n) => n.to_string(),
            PageControlKind::Ellipsis => "...".to_string(),
        }
    }
}

pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Controles para la página `current`; vacío si todo cabe en una página
pub fn page_controls(current: u32, total: u64, page_size: u32) -> Vec<PageControl> {
    let last = total_pages(total, page_size);
    if last <= 1 {
        return Vec::new();
    }
    let current = current.clamp(1, last);
    let start = current.saturating_sub(2).max(1);
    let end = current.saturating_add(2).min(last);

    let mut controls = vec![PageControl {
        kind: PageControlKind::Previous,
        target: Some(current.saturating_sub(1).max(1)),
        disabled: current == 1,
        active: false,
    }];

    if start > 1 {
        controls.push(PageControl::page(1, current));
        if start > 2 {
            controls.push(PageControl::ellipsis());
        }
    }
    controls.extend((start..=end).map(|page| PageControl::page(page, current)));
    if end < last {
        if end < last - 1 {
            controls.push(PageControl::ellipsis());
        }
        controls.push(PageControl::page(last, current));
    }

    controls.push(PageControl {
        kind: PageControlKind::Next,
        target: Some(current.saturating_add(1).min(last)),
        disabled: current == last,
        active: false,
    });
    controls
}

/// "Showing 11-20 of 35 records" / "0 records"
pub fn record_range_label(current: u32, page_size: u32, total: u64, rows_on_page: usize) -> String {
    if total == 0 || rows_on_page == 0 {
        return "0 records".to_string();
    }
    let first = u64::from(current.saturating_sub(1)) * u64::from(page_size) + 1;
    let last = (first + rows_on_page as u64 - 1).min(total);
    format!("Showing {}-{} of {} records", first, last, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn labels(controls: &[PageControl]) -> Vec<String> {
        controls.iter().map(PageControl::label).collect()
    }

    #[test]
    fn single_page_renders_nothing() {
        assert!(page_controls(1, 10, 10).is_empty());
        assert!(page_controls(1, 0, 10).is_empty());
    }

    #[test]
    fn window_with_ellipses() {
        let controls = page_controls(6, 200, 10);
        assert_eq!(
            labels(&controls),
            vec!["Previous", "1", "...", "4", "5", "6", "7", "8", "...", "20", "Next"]
        );
    }

    #[test]
    fn no_ellipsis_next_to_the_edges() {
        assert_eq!(labels(&page_controls(3, 50, 10)), vec!["Previous", "1", "2", "3", "4", "5", "Next"]);
        assert_eq!(labels(&page_controls(4, 60, 10)), vec!["Previous", "1", "2", "3", "4", "5", "6", "Next"]);
    }

    #[test]
    fn last_representable_page_does_not_overflow() {
        let controls = page_controls(u32::MAX, u64::MAX, 1);
        let expected: Vec<String> = ["Previous".to_string(), "1".to_string(), "...".to_string()]
            .into_iter()
            .chain((u32::MAX - 2..=u32::MAX).map(|page| page.to_string()))
            .chain(["Next".to_string()])
            .collect();
        assert_eq!(labels(&controls), expected);
        let next = controls.last().unwrap();
        assert!(next.disabled);
        assert_eq!(next.target, Some(u32::MAX));
    }

    #[test]
    fn range_label() {
        assert_eq!(record_range_label(1, 10, 0, 0), "0 records");
        assert_eq!(record_range_label(2, 10, 11, 1), "Showing 11-11 of 11 records");
        assert_eq!(record_range_label(1, 10, 35, 10), "Showing 1-10 of 35 records");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn bounds_and_active_page(total in 11u64..5_000, page_size in 1u32..50, raw_page in 1u32..500) {
            let last = total_pages(total, page_size);
            prop_assume!(last > 1);
            let current = raw_page.min(last);
            let controls = page_controls(current, total, page_size);

            let prev = controls.first().unwrap();
            let next = controls.last().unwrap();
            prop_assert_eq!(prev.kind, PageControlKind::Previous);
            prop_assert_eq!(next.kind, PageControlKind::Next);
            prop_assert_eq!(prev.disabled, current == 1);
            prop_assert_eq!(next.disabled, current == last);

            let active: Vec<_> = controls.iter().filter(|c| c.active).collect();
            prop_assert_eq!(active.len(), 1);
            prop_assert_eq!(active[0].kind, PageControlKind::Page(current));
            prop_assert!(!active[0].disabled);

            for control in &controls {
                if let Some(target) = control.target {
                    prop_assert!(target >= 1 && target <= last);
                }
            }
        }
    }
}
