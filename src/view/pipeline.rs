// src/view/pipeline.rs
use std::cmp::Ordering;
use std::ops::Range;
use std::sync::Arc;

use log::debug;

use crate::models::server::Server;
use crate::storage::directory::Snapshot;
use crate::utils::{contains_ignore_case, eq_ignore_case, locale_cmp};
use crate::view::state::{
    FilterState, ModQuery, Sort, SortColumn, SortDirection, ViewState,
};

/// Does `server` pass every active predicate of `filter`?
pub fn matches(server: &Server, filter: &FilterState) -> bool {
    let name = filter.name.trim();
    let version = filter.version.trim();

    contains_ignore_case(&server.name, name)
        && (version.is_empty() || server.game_version == version)
        && matches_mods(server, &filter.mods)
        && filter.has_password.map_or(true, |want| server.has_password == want)
        && filter.whitelisted.map_or(true, |want| server.whitelisted == want)
}

fn matches_mods(server: &Server, query: &ModQuery) -> bool {
    match query {
        ModQuery::Substring(q) => {
            let q = q.trim();
            q.is_empty() || server.mods.iter().any(|m| contains_ignore_case(&m.id, q))
        }
        ModQuery::AllOf(ids) => ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .all(|id| server.carries_mod(id)),
    }
}

/// Ascending order of two servers on `column`.
pub fn compare(a: &Server, b: &Server, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Name => locale_cmp(&a.name, &b.name),
        SortColumn::Description => locale_cmp(&a.description, &b.description),
        SortColumn::Mods => a.mod_count().cmp(&b.mod_count()),
        SortColumn::Players => a.players.cmp(&b.players),
        SortColumn::Version => locale_cmp(&a.game_version, &b.game_version),
    }
}

/// Indices of the servers that pass `filter`, ordered by `sort`.
///
/// Ascending is a stable sort; descending is its exact reverse. Without a
/// sort the filtered order is kept.
pub fn derive(servers: &[Server], filter: &FilterState, sort: Option<Sort>) -> Vec<usize> {
    let mut rows: Vec<usize> = servers
        .iter()
        .enumerate()
        .filter(|(_, s)| matches(s, filter))
        .map(|(i, _)| i)
        .collect();

    if let Some(sort) = sort {
        rows.sort_by(|&a, &b| compare(&servers[a], &servers[b], sort.column));
        if sort.direction == SortDirection::Descending {
            rows.reverse();
        }
    }
    rows
}

pub fn page_count(rows: usize, page_size: usize) -> usize {
    rows.div_ceil(page_size.max(1)).max(1)
}

/// Row range shown on `page` (1-based, already clamped).
pub fn page_bounds(rows: usize, page: usize, page_size: usize) -> Range<usize> {
    let page_size = page_size.max(1);
    let start = (page.max(1) - 1).saturating_mul(page_size).min(rows);
    let end = start.saturating_add(page_size).min(rows);
    start..end
}

/// Distinct non-empty game versions, newest-looking first.
pub fn available_versions(servers: &[Server]) -> Vec<String> {
    let mut versions: Vec<String> = Vec::new();
    for version in servers.iter().map(|s| s.game_version.as_str()) {
        if !version.is_empty() && !versions.iter().any(|v| v == version) {
            versions.push(version.to_string());
        }
    }
    versions.sort_by(|a, b| locale_cmp(a, b));
    versions.reverse();
    versions
}

/// Server table derived from the latest snapshot and the current
/// [`ViewState`].
///
/// Every setter recomputes synchronously, so readers never see a torn view.
/// Filter, sort and page-size changes send the cursor back to page 1; a new
/// snapshot keeps the cursor but clamps it.
pub struct ViewPipeline {
    servers: Snapshot,
    state: ViewState,
    rows: Vec<usize>,
    // Page asked for before any servers arrived (e.g. from a query string),
    // applied by the first snapshot unless the user moves first.
    restore_page: Option<usize>,
}

impl Default for ViewPipeline {
    fn default() -> Self {
        Self::new(ViewState::default())
    }
}

impl ViewPipeline {
    pub fn new(state: ViewState) -> Self {
        let mut pipeline = Self {
            servers: Arc::default(),
            state: ViewState::default(),
            rows: Vec::new(),
            restore_page: None,
        };
        pipeline.apply_state(state);
        pipeline
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn servers(&self) -> &Snapshot {
        &self.servers
    }

    pub fn set_servers(&mut self, servers: Snapshot) {
        self.servers = servers;
        if let Some(page) = self.restore_page.take() {
            self.state.page = page;
        }
        self.recompute();
    }

    pub fn set_name_filter(&mut self, name: &str) {
        self.update_filter(|f| f.name = name.to_string());
    }

    pub fn set_version_filter(&mut self, version: &str) {
        self.update_filter(|f| f.version = version.to_string());
    }

    /// Free-text mod filter.
    pub fn set_mod_filter(&mut self, text: &str) {
        self.update_filter(|f| f.mods = ModQuery::Substring(text.to_string()));
    }

    pub fn set_mod_query(&mut self, query: ModQuery) {
        self.update_filter(|f| f.mods = query);
    }

    /// Adds `id` to the selected mod set, switching to set mode. Blank ids
    /// and ids already selected (ignoring case) are ignored.
    pub fn add_mod_filter(&mut self, id: &str) {
        let id = id.trim();
        if id.is_empty() {
            return;
        }
        let mut ids = self.selected_mods();
        if ids.iter().any(|existing| eq_ignore_case(existing, id)) {
            return;
        }
        ids.push(id.to_string());
        self.set_mod_query(ModQuery::AllOf(ids));
    }

    pub fn remove_mod_filter(&mut self, id: &str) {
        let id = id.trim();
        let mut ids = self.selected_mods();
        let before = ids.len();
        ids.retain(|existing| !eq_ignore_case(existing, id));
        if ids.len() != before {
            self.set_mod_query(ModQuery::AllOf(ids));
        }
    }

    /// Ids currently selected in set mode.
    pub fn selected_mods(&self) -> Vec<String> {
        match &self.state.filter.mods {
            ModQuery::AllOf(ids) => ids.clone(),
            ModQuery::Substring(_) => Vec::new(),
        }
    }

    pub fn set_password_filter(&mut self, has_password: Option<bool>) {
        self.update_filter(|f| f.has_password = has_password);
    }

    pub fn set_whitelist_filter(&mut self, whitelisted: Option<bool>) {
        self.update_filter(|f| f.whitelisted = whitelisted);
    }

    pub fn clear_filters(&mut self) {
        self.update_filter(|f| *f = FilterState::default());
    }

    /// Header click: the same column flips direction, another column starts
    /// ascending.
    pub fn sort_by(&mut self, column: SortColumn) {
        let direction = match self.state.sort {
            Some(current) if current.column == column => current.direction.toggled(),
            _ => SortDirection::Ascending,
        };
        self.state.sort = Some(Sort { column, direction });
        self.state.page = 1;
        self.restore_page = None;
        self.recompute();
    }

    pub fn set_sort(&mut self, sort: Option<Sort>) {
        if self.state.sort != sort {
            self.state.sort = sort;
            self.state.page = 1;
            self.restore_page = None;
            self.recompute();
        }
    }

    /// Zero is treated as 1.
    pub fn set_page_size(&mut self, page_size: usize) {
        let page_size = page_size.max(1);
        if self.state.page_size != page_size {
            self.state.page_size = page_size;
            self.state.page = 1;
            self.restore_page = None;
            self.recompute();
        }
    }

    /// Moves to `page`, clamped into range.
    pub fn set_page(&mut self, page: usize) {
        self.restore_page = None;
        self.state.page = page.clamp(1, self.page_count());
    }

    pub fn next_page(&mut self) {
        self.restore_page = None;
        if self.state.page < self.page_count() {
            self.state.page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        self.restore_page = None;
        if self.state.page > 1 {
            self.state.page -= 1;
        }
    }

    pub fn page(&self) -> usize {
        self.state.page
    }

    pub fn page_size(&self) -> usize {
        self.state.page_size
    }

    pub fn page_count(&self) -> usize {
        page_count(self.rows.len(), self.state.page_size)
    }

    pub fn filtered_count(&self) -> usize {
        self.rows.len()
    }

    /// Filtered and sorted servers, every page.
    pub fn sorted(&self) -> impl Iterator<Item = &Server> + '_ {
        self.rows.iter().map(move |&i| &self.servers[i])
    }

    /// Servers on the current page.
    pub fn visible(&self) -> Vec<&Server> {
        let bounds = page_bounds(self.rows.len(), self.state.page, self.state.page_size);
        self.rows[bounds].iter().map(|&i| &self.servers[i]).collect()
    }

    pub fn available_versions(&self) -> Vec<String> {
        available_versions(&self.servers)
    }

    /// Applies a whole state at once, e.g. after reading the query string.
    pub fn apply_state(&mut self, state: ViewState) {
        self.state = state;
        self.state.page_size = self.state.page_size.max(1);
        self.restore_page = (self.servers.is_empty() && self.state.page > 1).then_some(self.state.page);
        self.recompute();
    }

    fn update_filter(&mut self, change: impl FnOnce(&mut FilterState)) {
        let mut filter = self.state.filter.clone();
        change(&mut filter);
        if filter != self.state.filter {
            self.state.filter = filter;
            self.state.page = 1;
            self.restore_page = None;
            self.recompute();
        }
    }

    fn recompute(&mut self) {
        self.rows = derive(&self.servers, &self.state.filter, self.state.sort);
        let last = self.page_count();
        if self.state.page > last {
            debug!("Clamping page {} to {}", self.state.page, last);
            self.state.page = last;
        }
        self.state.page = self.state.page.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::server::Mod;

    fn server(name: &str, players: u32) -> Server {
        Server {
            ip: format!("{}.local", name),
            name: name.to_string(),
            description: String::new(),
            players,
            max_players: 32,
            game_version: String::new(),
            has_password: false,
            whitelisted: false,
            mods: Vec::new(),
        }
    }

    fn with_mods(mut s: Server, ids: &[&str]) -> Server {
        s.mods = ids
            .iter()
            .map(|id| Mod {
                id: id.to_string(),
                version: "1.0.0".into(),
            })
            .collect();
        s
    }

    fn names(pipeline: &ViewPipeline) -> Vec<String> {
        pipeline.visible().iter().map(|s| s.name.clone()).collect()
    }

    fn pipeline_over(servers: Vec<Server>) -> ViewPipeline {
        let mut pipeline = ViewPipeline::default();
        pipeline.set_servers(Arc::new(servers));
        pipeline
    }

    #[test]
    fn players_sort_toggles_direction() {
        let mut pipeline = pipeline_over(vec![server("A", 3), server("B", 1)]);

        pipeline.sort_by(SortColumn::Players);
        assert_eq!(names(&pipeline), vec!["B", "A"]);
        pipeline.sort_by(SortColumn::Players);
        assert_eq!(names(&pipeline), vec!["A", "B"]);
    }

    #[test]
    fn toggling_twice_restores_order() {
        let mut pipeline = pipeline_over(vec![
            server("c", 2),
            server("a", 2),
            server("b", 7),
            server("d", 0),
        ]);
        pipeline.sort_by(SortColumn::Players);
        let first = names(&pipeline);
        pipeline.sort_by(SortColumn::Players);
        pipeline.sort_by(SortColumn::Players);
        assert_eq!(names(&pipeline), first);
        // Stable: equal player counts keep their filtered order.
        assert_eq!(first, vec!["d", "c", "a", "b"]);
    }

    #[test]
    fn other_column_resets_to_ascending() {
        let mut pipeline = pipeline_over(vec![server("b", 1), server("a", 2)]);
        pipeline.sort_by(SortColumn::Players);
        pipeline.sort_by(SortColumn::Players);
        pipeline.sort_by(SortColumn::Name);
        assert_eq!(
            pipeline.state().sort,
            Some(Sort {
                column: SortColumn::Name,
                direction: SortDirection::Ascending
            })
        );
        assert_eq!(names(&pipeline), vec!["a", "b"]);
    }

    #[test]
    fn no_sort_keeps_filtered_order() {
        let pipeline = pipeline_over(vec![server("z", 1), server("a", 9), server("m", 5)]);
        assert_eq!(names(&pipeline), vec!["z", "a", "m"]);
    }

    #[test]
    fn mod_substring_ignores_case() {
        let mut pipeline = pipeline_over(vec![
            with_mods(server("hit", 0), &["ABCxyz"]),
            with_mods(server("miss", 0), &["other"]),
            server("vanilla", 0),
        ]);
        pipeline.set_mod_filter("abc");
        assert_eq!(names(&pipeline), vec!["hit"]);
    }

    #[test]
    fn mod_set_requires_every_id() {
        let mut pipeline = pipeline_over(vec![
            with_mods(server("both", 0), &["CarryOn", "Prospector"]),
            with_mods(server("one", 0), &["carryon"]),
            with_mods(server("prefix", 0), &["carryonextra", "prospector"]),
        ]);
        pipeline.add_mod_filter("carryon");
        pipeline.add_mod_filter("PROSPECTOR");
        pipeline.add_mod_filter("Carryon");
        assert_eq!(pipeline.selected_mods(), vec!["carryon", "PROSPECTOR"]);
        assert_eq!(names(&pipeline), vec!["both"]);

        pipeline.remove_mod_filter("prospector");
        assert_eq!(names(&pipeline), vec!["both", "one"]);
    }

    #[test]
    fn mod_chips_fold_non_ascii_case() {
        let mut pipeline = pipeline_over(vec![
            with_mods(server("umlaut", 0), &["ÄrmelMod"]),
            with_mods(server("plain", 0), &["armelmod"]),
        ]);
        pipeline.add_mod_filter("ÄrmelMod");
        pipeline.add_mod_filter("ärmelmod");
        assert_eq!(pipeline.selected_mods(), vec!["ÄrmelMod"]);
        assert_eq!(names(&pipeline), vec!["umlaut"]);

        pipeline.remove_mod_filter("ÄRMELMOD");
        assert!(pipeline.selected_mods().is_empty());
        assert_eq!(names(&pipeline).len(), 2);
    }

    #[test]
    fn predicates_combine_with_and() {
        let mut locked = server("Locked Home", 0);
        locked.has_password = true;
        locked.game_version = "1.20.3".into();
        let mut open = server("Open Home", 0);
        open.game_version = "1.20.3".into();
        let mut old = server("Old Home", 0);
        old.game_version = "1.19.8".into();
        old.whitelisted = true;

        let mut pipeline = pipeline_over(vec![locked, open, old]);
        pipeline.set_name_filter("  home ");
        pipeline.set_version_filter("1.20.3");
        assert_eq!(names(&pipeline), vec!["Locked Home", "Open Home"]);

        pipeline.set_password_filter(Some(false));
        assert_eq!(names(&pipeline), vec!["Open Home"]);

        pipeline.clear_filters();
        pipeline.set_whitelist_filter(Some(true));
        assert_eq!(names(&pipeline), vec!["Old Home"]);
    }

    #[test]
    fn pages_are_contiguous_slices_of_the_sorted_rows() {
        let servers: Vec<Server> = (0..23).map(|i| server(&format!("s{:02}", i), i)).collect();
        let mut pipeline = pipeline_over(servers);
        pipeline.sort_by(SortColumn::Players);
        pipeline.sort_by(SortColumn::Players);

        for page_size in [1, 4, 5, 20, 23, 40] {
            pipeline.set_page_size(page_size);
            let sorted: Vec<String> = pipeline.sorted().map(|s| s.name.clone()).collect();
            for page in 1..=pipeline.page_count() {
                pipeline.set_page(page);
                let visible = names(&pipeline);
                assert!(visible.len() <= page_size);
                let start = (page - 1) * page_size;
                assert_eq!(visible, sorted[start..start + visible.len()].to_vec());
            }
        }
    }

    #[test]
    fn query_page_survives_until_first_snapshot() {
        let mut state = ViewState::default();
        state.page = 2;
        let mut pipeline = ViewPipeline::new(state);
        assert_eq!(pipeline.page(), 1);

        pipeline.set_servers(Arc::new((0..30).map(|i| server(&i.to_string(), i)).collect()));
        assert_eq!(pipeline.page(), 2);
    }

    #[test]
    fn page_count_never_drops_below_one() {
        let pipeline = pipeline_over(Vec::new());
        assert_eq!(pipeline.page_count(), 1);
        assert_eq!(pipeline.page(), 1);
        assert!(pipeline.visible().is_empty());
        assert_eq!(page_count(41, 20), 3);
    }

    #[test]
    fn out_of_range_pages_clamp() {
        let servers: Vec<Server> = (0..45).map(|i| server(&i.to_string(), i)).collect();
        let mut pipeline = pipeline_over(servers);
        pipeline.set_page(99);
        assert_eq!(pipeline.page(), 3);
        pipeline.set_page(0);
        assert_eq!(pipeline.page(), 1);
        pipeline.prev_page();
        assert_eq!(pipeline.page(), 1);
        pipeline.next_page();
        pipeline.next_page();
        pipeline.next_page();
        assert_eq!(pipeline.page(), 3);
    }

    #[test]
    fn shrinking_snapshot_clamps_page() {
        let many: Vec<Server> = (0..60).map(|i| server(&i.to_string(), i)).collect();
        let mut pipeline = pipeline_over(many);
        pipeline.set_page(3);
        assert_eq!(pipeline.page(), 3);

        let few: Vec<Server> = (0..25).map(|i| server(&i.to_string(), i)).collect();
        pipeline.set_servers(Arc::new(few));
        assert_eq!(pipeline.page(), 2);
        assert_eq!(pipeline.visible().len(), 5);
    }

    #[test]
    fn growing_snapshot_keeps_page() {
        let mut pipeline = pipeline_over((0..45).map(|i| server(&i.to_string(), i)).collect());
        pipeline.set_page(2);
        pipeline.set_servers(Arc::new((0..90).map(|i| server(&i.to_string(), i)).collect()));
        assert_eq!(pipeline.page(), 2);
    }

    #[test]
    fn filter_sort_and_page_size_changes_reset_page() {
        let servers: Vec<Server> = (0..60).map(|i| server(&format!("srv{}", i), i)).collect();
        let mut pipeline = pipeline_over(servers);

        pipeline.set_page(3);
        pipeline.set_name_filter("srv");
        assert_eq!(pipeline.page(), 1);

        pipeline.set_page(3);
        pipeline.sort_by(SortColumn::Name);
        assert_eq!(pipeline.page(), 1);

        pipeline.set_page(3);
        pipeline.set_page_size(10);
        assert_eq!(pipeline.page(), 1);
        assert_eq!(pipeline.state().filter.name, "srv");

        // Re-applying the same filter is not a change.
        pipeline.set_page(4);
        pipeline.set_name_filter("srv");
        assert_eq!(pipeline.page(), 4);
    }

    #[test]
    fn versions_are_distinct_sorted_and_reversed() {
        let mut a = server("a", 0);
        a.game_version = "1.19.8".into();
        let mut b = server("b", 0);
        b.game_version = "1.20.3".into();
        let mut c = server("c", 0);
        c.game_version = "1.19.8".into();
        let d = server("d", 0);

        let pipeline = pipeline_over(vec![a, b, c, d]);
        assert_eq!(pipeline.available_versions(), vec!["1.20.3", "1.19.8"]);
    }

    #[test]
    fn page_bounds_stay_in_range() {
        assert_eq!(page_bounds(0, 1, 20), 0..0);
        assert_eq!(page_bounds(45, 3, 20), 40..45);
        assert_eq!(page_bounds(45, 9, 20), 45..45);
        assert_eq!(page_bounds(5, 1, 0), 0..1);
    }
}
