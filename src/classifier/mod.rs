use crate::constants::UNKNOWN_LABEL;
use crate::models::{ActiveItem, Category};
use crate::platform::Observation;
use crate::website::{extract_domain, is_browser, normalize_domain};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Built-in executable table: lowercase executable name, display name, category.
/// Browsers stay `Unknown`; their real category comes from the visited domain.
const DEFAULT_APPLICATIONS: &[(&str, &str, Category)] = &[
    // IDEs / editors
    ("idea64.exe", "IntelliJ IDEA", Category::Productive),
    ("pycharm64.exe", "PyCharm", Category::Productive),
    ("code.exe", "Visual Studio Code", Category::Productive),
    ("eclipse.exe", "Eclipse", Category::Productive),
    ("sublime_text.exe", "Sublime Text", Category::Productive),
    ("notepad++.exe", "Notepad++", Category::Productive),

    // Browsers
    ("chrome.exe", "Google Chrome", Category::Unknown),
    ("msedge.exe", "Microsoft Edge", Category::Unknown),
    ("firefox.exe", "Mozilla Firefox", Category::Unknown),
    ("brave.exe", "Brave Browser", Category::Unknown),

    // Work
    ("outlook.exe", "Outlook", Category::Productive),
    ("slack.exe", "Slack", Category::Productive),

    // Games
    ("steam.exe", "Steam", Category::Distracting),
    ("valorant.exe", "Valorant", Category::Distracting),
    ("csgo.exe", "CS:GO", Category::Distracting),
    ("minecraft.exe", "Minecraft", Category::Distracting),
    ("leagueoflegends.exe", "League of Legends", Category::Distracting),

    // Media
    ("spotify.exe", "Spotify", Category::Distracting),
    ("vlc.exe", "VLC Media Player", Category::Distracting),
];

const DEFAULT_DOMAIN_RULES: &[(&str, Category)] = &[
    ("github.com", Category::Productive),
    ("gitlab.com", Category::Productive),
    ("stackoverflow.com", Category::Productive),
    ("docs.rs", Category::Productive),
    ("youtube.com", Category::Distracting),
    ("netflix.com", Category::Distracting),
    ("twitter.com", Category::Distracting),
    ("x.com", Category::Distracting),
    ("reddit.com", Category::Distracting),
    ("facebook.com", Category::Distracting),
    ("instagram.com", Category::Distracting),
    ("tiktok.com", Category::Distracting),
    ("twitch.tv", Category::Distracting),
];

/// Extra executable mapping supplied through configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppMapping {
    pub executable: String,
    pub display_name: String,
    #[serde(default)]
    pub category: Category,
}

/// Extra domain category rule supplied through configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRule {
    pub pattern: String,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub display_name: String,
    pub category: Category,
}

/// Strip any directory and a trailing `.exe` from a process name.
pub fn normalize_app_name(raw: &str) -> String {
    let base = raw.rsplit(['\\', '/']).next().unwrap_or(raw);
    let stem = if base.to_lowercase().ends_with(".exe") {
        base.get(..base.len() - 4).unwrap_or(base)
    } else {
        base
    };
    stem.trim().to_string()
}

/// Immutable lookup tables, built once at startup.
pub struct Classifier {
    applications: HashMap<String, Classification>,
    domain_rules: Vec<DomainRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&[], &[])
    }
}

impl Classifier {
    /// Build the tables from the built-in defaults plus configured extras.
    /// Configured applications replace built-ins with the same executable;
    /// configured domain rules are checked before the built-in ones.
    pub fn new(extra_applications: &[AppMapping], extra_domain_rules: &[DomainRule]) -> Self {
        let mut applications: HashMap<String, Classification> = DEFAULT_APPLICATIONS
            .iter()
            .map(|(exe, name, category)| {
                (
                    (*exe).to_string(),
                    Classification { display_name: (*name).to_string(), category: *category },
                )
            })
            .collect();

        for mapping in extra_applications {
            applications.insert(
                mapping.executable.trim().to_lowercase(),
                Classification {
                    display_name: mapping.display_name.clone(),
                    category: mapping.category,
                },
            );
        }

        let domain_rules = extra_domain_rules
            .iter()
            .cloned()
            .chain(DEFAULT_DOMAIN_RULES.iter().map(|(pattern, category)| DomainRule {
                pattern: (*pattern).to_string(),
                category: *category,
            }))
            .collect();

        Self { applications, domain_rules }
    }

    /// Map an executable name to a display name and category. Never fails:
    /// unmapped executables keep their own base name with an unknown category.
    pub fn classify(&self, executable: &str) -> Classification {
        let base = executable.rsplit(['\\', '/']).next().unwrap_or(executable).trim();
        if base.is_empty() {
            return Classification {
                display_name: UNKNOWN_LABEL.to_string(),
                category: Category::Unknown,
            };
        }

        let key = base.to_lowercase();
        let mapped = self.applications.get(&key).or_else(|| {
            // Non-Windows process names carry no extension
            if key.ends_with(".exe") {
                None
            } else {
                self.applications.get(&format!("{key}.exe"))
            }
        });

        match mapped {
            Some(found) => found.clone(),
            None => Classification {
                display_name: normalize_app_name(base),
                category: Category::Unknown,
            },
        }
    }

    pub fn classify_domain(&self, domain: &str) -> Category {
        self.domain_rules
            .iter()
            .find(|rule| Self::pattern_matches(&rule.pattern, domain))
            .map_or(Category::Unknown, |rule| rule.category)
    }

    /// Turn a raw observation into the item the user is engaged with.
    ///
    /// Browsers resolve to a website when a domain can be recovered from the
    /// title; everything else, including unreadable windows, resolves to an
    /// application.
    pub fn resolve(&self, observation: &Observation) -> ActiveItem {
        let Some(executable) = observation.process_executable.as_deref() else {
            return ActiveItem::unknown();
        };

        if is_browser(executable) {
            let domain = observation
                .window_title
                .as_deref()
                .and_then(extract_domain)
                .map(|d| normalize_domain(&d))
                .filter(|d| !d.is_empty());

            if let Some(domain) = domain {
                let category = self.classify_domain(&domain);
                return ActiveItem::website(domain, category);
            }
        }

        let classification = self.classify(executable);
        ActiveItem::application(classification.display_name, classification.category)
    }

    fn pattern_matches(pattern: &str, domain: &str) -> bool {
        let pattern_lower = pattern.to_lowercase();
        let domain_lower = domain.to_lowercase();

        if pattern_lower.contains('*') {
            let mut rest = domain_lower.as_str();
            for part in pattern_lower.split('*') {
                if part.is_empty() { continue; }
                match rest.find(part) {
                    Some(found) => rest = rest.get(found + part.len()..).unwrap_or(""),
                    None => return false,
                }
            }
            true
        } else {
            domain_lower == pattern_lower
                || domain_lower
                    .strip_suffix(&pattern_lower)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
    }
}
