// src/view/state.rs
use url::form_urlencoded;

use crate::utils::parse_tri_state;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Name,
    Description,
    Mods,
    Players,
    Version,
}

impl SortColumn {
    pub const ALL: [SortColumn; 5] = [
        SortColumn::Name,
        SortColumn::Description,
        SortColumn::Mods,
        SortColumn::Players,
        SortColumn::Version,
    ];

    /// Key used for this column in the query string.
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Name => "serverName",
            Self::Description => "gameDescription",
            Self::Mods => "mods",
            Self::Players => "players",
            Self::Version => "gameVersion",
        }
    }

    pub fn from_param(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "servername" | "name" => Some(Self::Name),
            "gamedescription" | "description" => Some(Self::Description),
            "mods" => Some(Self::Mods),
            "players" => Some(Self::Players),
            "gameversion" | "version" => Some(Self::Version),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: SortColumn,
    pub direction: SortDirection,
}

/// How the mod filter is matched against a server's manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModQuery {
    /// Free text: any mod id contains it, ignoring case.
    Substring(String),
    /// Chips: the server must carry every listed id, ignoring case.
    AllOf(Vec<String>),
}

impl Default for ModQuery {
    fn default() -> Self {
        Self::Substring(String::new())
    }
}

impl ModQuery {
    pub fn is_active(&self) -> bool {
        match self {
            Self::Substring(q) => !q.trim().is_empty(),
            Self::AllOf(ids) => ids.iter().any(|id| !id.trim().is_empty()),
        }
    }

    fn from_param(values: &[String]) -> Self {
        let joined = values.join(",");
        if values.len() > 1 || joined.contains(',') {
            let ids = joined
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
            Self::AllOf(ids)
        } else {
            Self::Substring(joined)
        }
    }

    fn to_param(&self) -> Option<String> {
        match self {
            Self::Substring(q) => Some(q.trim().to_string()).filter(|q| !q.is_empty()),
            Self::AllOf(ids) => {
                let ids: Vec<&str> = ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()).collect();
                match ids.len() {
                    0 => None,
                    // Trailing comma keeps a single chip from reading back as free text.
                    1 => Some(format!("{},", ids[0])),
                    _ => Some(ids.join(",")),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub name: String,
    pub version: String,
    pub mods: ModQuery,
    pub has_password: Option<bool>,
    pub whitelisted: Option<bool>,
}

impl FilterState {
    pub fn is_active(&self) -> bool {
        !self.name.trim().is_empty()
            || !self.version.trim().is_empty()
            || self.mods.is_active()
            || self.has_password.is_some()
            || self.whitelisted.is_some()
    }
}

/// Everything the UI can change about the server table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub filter: FilterState,
    pub sort: Option<Sort>,
    pub page_size: usize,
    /// 1-based.
    pub page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl ViewState {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            filter: FilterState::default(),
            sort: None,
            page_size: page_size.max(1),
            page: 1,
        }
    }

    /// Reads a query string (`name`, `version`, `mod`, `hasPassword`,
    /// `whitelisted`, `pageSize`, `page`, `sort`, `dir`). Anything missing or
    /// unparseable keeps its default.
    pub fn from_query(query: &str) -> Self {
        Self::from_query_with_defaults(query, DEFAULT_PAGE_SIZE)
    }

    pub fn from_query_with_defaults(query: &str, default_page_size: usize) -> Self {
        let mut state = Self::with_page_size(default_page_size);
        let mut mod_values: Vec<String> = Vec::new();
        let mut dir: Option<String> = None;
        let mut sort: Option<SortColumn> = None;

        let query = query.trim().trim_start_matches('?');
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match &*key {
                "name" => state.filter.name = value.into_owned(),
                "version" => state.filter.version = value.into_owned(),
                "mod" => mod_values.push(value.into_owned()),
                "hasPassword" => {
                    if let Some(parsed) = parse_tri_state(&value) {
                        state.filter.has_password = parsed;
                    }
                }
                "whitelisted" => {
                    if let Some(parsed) = parse_tri_state(&value) {
                        state.filter.whitelisted = parsed;
                    }
                }
                "pageSize" => {
                    if let Some(size) = parse_positive(&value) {
                        state.page_size = size;
                    }
                }
                "page" => state.page = parse_positive(&value).unwrap_or(1),
                "sort" => sort = SortColumn::from_param(&value),
                "dir" => dir = Some(value.trim().to_lowercase()),
                _ => {}
            }
        }

        if !mod_values.is_empty() {
            state.filter.mods = ModQuery::from_param(&mod_values);
        }
        state.sort = sort.map(|column| Sort {
            column,
            direction: match dir.as_deref() {
                Some("desc") => SortDirection::Descending,
                _ => SortDirection::Ascending,
            },
        });
        state
    }

    /// Writes the state back as a query string, leaving out every value that
    /// equals its default.
    pub fn to_query(&self) -> String {
        self.to_query_with_defaults(DEFAULT_PAGE_SIZE)
    }

    pub fn to_query_with_defaults(&self, default_page_size: usize) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());

        let name = self.filter.name.trim();
        if !name.is_empty() {
            out.append_pair("name", name);
        }
        let version = self.filter.version.trim();
        if !version.is_empty() {
            out.append_pair("version", version);
        }
        if let Some(mods) = self.filter.mods.to_param() {
            out.append_pair("mod", &mods);
        }
        if let Some(flag) = self.filter.has_password {
            out.append_pair("hasPassword", if flag { "true" } else { "false" });
        }
        if let Some(flag) = self.filter.whitelisted {
            out.append_pair("whitelisted", if flag { "true" } else { "false" });
        }
        if self.page_size != default_page_size {
            out.append_pair("pageSize", &self.page_size.to_string());
        }
        if self.page != 1 {
            out.append_pair("page", &self.page.to_string());
        }
        if let Some(sort) = self.sort {
            out.append_pair("sort", sort.column.as_param());
            if sort.direction == SortDirection::Descending {
                out.append_pair("dir", "desc");
            }
        }

        out.finish()
    }
}

fn parse_positive(value: &str) -> Option<usize> {
    let value = value.trim();
    if let Ok(n) = value.parse::<usize>() {
        return (n > 0).then_some(n);
    }
    // Accept "2.0"-style numbers the way a browser would, flooring them.
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 1.0)
        .map(|n| n.floor() as usize)
}
