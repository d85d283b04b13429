// Reference data loading: hero roster, pair tables, team history, strategy.
//
// CSV files are read with serde; malformed rows are skipped with a warning
// rather than failing the whole file. Secondary tables that name heroes
// missing from the roster have those rows dropped.

use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::draft::sequence::Side;
use crate::hero::{Hero, HeroId, HeroPool, RoleAliases, Tier};
use crate::scoring::context::{
    CounterTable, EnemyThreat, FirstPickPreference, GlobalBans, ReferenceData, Strategy, SynergyTable,
    TeamProfile,
};

// ---------------------------------------------------------------------------
// Paths and errors
// ---------------------------------------------------------------------------

/// Locations of the reference data files. Only the roster is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPaths {
    pub heroes: String,
    #[serde(default)]
    pub synergy: Option<String>,
    #[serde(default)]
    pub counters: Option<String>,
    #[serde(default)]
    pub team_pool: Option<String>,
    #[serde(default)]
    pub first_picks: Option<String>,
    #[serde(default)]
    pub threats: Option<String>,
    #[serde(default)]
    pub strategy: Option<String>,
}

impl Default for DataPaths {
    fn default() -> Self {
        DataPaths {
            heroes: "data/heroes.csv".into(),
            synergy: Some("data/synergy.csv".into()),
            counters: Some("data/counters.csv".into()),
            team_pool: Some("data/team_pool.csv".into()),
            first_picks: Some("data/first_picks.csv".into()),
            threats: Some("data/threats.csv".into()),
            strategy: Some("config/strategy.toml".into()),
        }
    }
}

impl DataPaths {
    /// Resolve relative paths against `base`.
    pub fn resolved(&self, base: &Path) -> DataPaths {
        let join = |p: &String| -> String {
            let path = Path::new(p);
            if path.is_absolute() {
                p.clone()
            } else {
                base.join(path).display().to_string()
            }
        };
        DataPaths {
            heroes: join(&self.heroes),
            synergy: self.synergy.as_ref().map(join),
            counters: self.counters.as_ref().map(join),
            team_pool: self.team_pool.as_ref().map(join),
            first_picks: self.first_picks.as_ref().map(join),
            threats: self.threats.as_ref().map(join),
            strategy: self.strategy.as_ref().map(join),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("failed to parse {path}: {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV rows (private)
// ---------------------------------------------------------------------------

/// Hero roster row. Columns not named here are ignored.
#[derive(Debug, Deserialize)]
struct RawHero {
    id: u32,
    name: String,
    roles: String,
    #[serde(default)]
    tier: String,
    win_rate: f64,
}

#[derive(Debug, Deserialize)]
struct RawSynergy {
    hero_a: u32,
    hero_b: u32,
    score: f64,
    #[serde(flatten)]
    _extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawCounter {
    hero: u32,
    opponent: u32,
    win_rate: f64,
    #[serde(flatten)]
    _extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawPoolEntry {
    hero_id: u32,
    #[serde(alias = "matches")]
    matches_played: u32,
}

#[derive(Debug, Deserialize)]
struct RawFirstPick {
    hero_id: u32,
    win_rate: f64,
    pick_count: u32,
}

#[derive(Debug, Deserialize)]
struct RawThreat {
    hero_id: u32,
    win_rate: f64,
    threat_level: f64,
}

/// `strategy.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyFile {
    #[serde(default)]
    pub core: BTreeSet<HeroId>,
    #[serde(default)]
    pub avoid: BTreeSet<HeroId>,
    #[serde(default)]
    pub global_bans: GlobalBans,
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, testable without temp files)
// ---------------------------------------------------------------------------

fn read_rows<T: DeserializeOwned, R: Read>(rdr: R, what: &str) -> Result<Vec<T>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut rows = Vec::new();
    for result in reader.deserialize::<T>() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => warn!("skipping malformed {} row: {}", what, e),
        }
    }
    Ok(rows)
}

fn load_heroes_from_reader<R: Read>(rdr: R, aliases: &RoleAliases) -> Result<Vec<Hero>, csv::Error> {
    let mut heroes = Vec::new();
    for raw in read_rows::<RawHero, _>(rdr, "hero")? {
        let name = raw.name.trim().to_string();
        if !raw.win_rate.is_finite() {
            warn!("skipping hero '{}': non-finite win rate", name);
            continue;
        }
        let roles = match aliases.parse_list(&raw.roles) {
            Ok(roles) if !roles.is_empty() => roles,
            Ok(_) => {
                warn!("skipping hero '{}': no roles", name);
                continue;
            }
            Err(unknown) => {
                warn!("skipping hero '{}': unknown role '{}'", name, unknown);
                continue;
            }
        };
        let tier = if raw.tier.trim().is_empty() {
            Tier::B
        } else {
            match Tier::from_str_tier(&raw.tier) {
                Some(t) => t,
                None => {
                    warn!("hero '{}' has unknown tier '{}', using B", name, raw.tier);
                    Tier::B
                }
            }
        };
        heroes.push(Hero {
            id: HeroId(raw.id),
            name,
            roles,
            tier,
            win_rate: raw.win_rate,
        });
    }
    Ok(heroes)
}

fn load_synergy_from_reader<R: Read>(rdr: R) -> Result<Vec<(HeroId, HeroId, f64)>, csv::Error> {
    Ok(read_rows::<RawSynergy, _>(rdr, "synergy")?
        .into_iter()
        .filter(|r| r.score.is_finite())
        .map(|r| (HeroId(r.hero_a), HeroId(r.hero_b), r.score))
        .collect())
}

fn load_counters_from_reader<R: Read>(rdr: R) -> Result<Vec<(HeroId, HeroId, f64)>, csv::Error> {
    Ok(read_rows::<RawCounter, _>(rdr, "counter")?
        .into_iter()
        .filter(|r| r.win_rate.is_finite())
        .map(|r| (HeroId(r.hero), HeroId(r.opponent), r.win_rate))
        .collect())
}

fn load_team_pool_from_reader<R: Read>(rdr: R) -> Result<HashMap<HeroId, u32>, csv::Error> {
    let mut pool = HashMap::new();
    for raw in read_rows::<RawPoolEntry, _>(rdr, "team pool")? {
        let id = HeroId(raw.hero_id);
        if pool.contains_key(&id) {
            warn!("duplicate team pool entry for {}, adding match counts", id);
        }
        *pool.entry(id).or_insert(0) += raw.matches_played;
    }
    Ok(pool)
}

fn load_first_picks_from_reader<R: Read>(rdr: R) -> Result<Vec<FirstPickPreference>, csv::Error> {
    Ok(read_rows::<RawFirstPick, _>(rdr, "first pick")?
        .into_iter()
        .filter(|r| r.win_rate.is_finite())
        .map(|r| FirstPickPreference {
            hero: HeroId(r.hero_id),
            win_rate: r.win_rate,
            pick_count: r.pick_count,
        })
        .collect())
}

fn load_threats_from_reader<R: Read>(rdr: R) -> Result<Vec<EnemyThreat>, csv::Error> {
    Ok(read_rows::<RawThreat, _>(rdr, "threat")?
        .into_iter()
        .filter(|r| r.win_rate.is_finite() && r.threat_level.is_finite())
        .map(|r| EnemyThreat {
            hero: HeroId(r.hero_id),
            win_rate: r.win_rate,
            threat_level: r.threat_level,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

fn with_file<T>(
    path: &Path,
    load: impl FnOnce(std::fs::File) -> Result<T, csv::Error>,
) -> Result<T, DataError> {
    let file = std::fs::File::open(path).map_err(|e| DataError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load(file).map_err(|e| DataError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn load_heroes(path: &Path, aliases: &RoleAliases) -> Result<Vec<Hero>, DataError> {
    with_file(path, |f| load_heroes_from_reader(f, aliases))
}

pub fn load_synergy(path: &Path) -> Result<Vec<(HeroId, HeroId, f64)>, DataError> {
    with_file(path, load_synergy_from_reader)
}

pub fn load_counters(path: &Path) -> Result<Vec<(HeroId, HeroId, f64)>, DataError> {
    with_file(path, load_counters_from_reader)
}

pub fn load_team_pool(path: &Path) -> Result<HashMap<HeroId, u32>, DataError> {
    with_file(path, load_team_pool_from_reader)
}

pub fn load_first_picks(path: &Path) -> Result<Vec<FirstPickPreference>, DataError> {
    with_file(path, load_first_picks_from_reader)
}

pub fn load_threats(path: &Path) -> Result<Vec<EnemyThreat>, DataError> {
    with_file(path, load_threats_from_reader)
}

pub fn load_strategy(path: &Path) -> Result<StrategyFile, DataError> {
    let contents = std::fs::read_to_string(path).map_err(|e| DataError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    toml::from_str(&contents).map_err(|e| DataError::Toml {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Load every configured file and assemble the session's reference data.
pub fn load_reference(
    paths: &DataPaths,
    aliases: &RoleAliases,
    our_side: Option<Side>,
) -> Result<ReferenceData, DataError> {
    let heroes = load_heroes(Path::new(&paths.heroes), aliases)?;
    if heroes.is_empty() {
        return Err(DataError::Validation(format!(
            "hero roster {} produced zero valid rows",
            paths.heroes
        )));
    }
    let heroes = HeroPool::new(heroes);

    let optional = |p: &Option<String>| p.as_ref().map(PathBuf::from);

    let synergy_rows = match optional(&paths.synergy) {
        Some(p) => load_synergy(&p)?,
        None => Vec::new(),
    };
    let counter_rows = match optional(&paths.counters) {
        Some(p) => load_counters(&p)?,
        None => Vec::new(),
    };
    let pool_history = match optional(&paths.team_pool) {
        Some(p) => load_team_pool(&p)?,
        None => HashMap::new(),
    };
    let first_picks = match optional(&paths.first_picks) {
        Some(p) => load_first_picks(&p)?,
        None => Vec::new(),
    };
    let threats = match optional(&paths.threats) {
        Some(p) => load_threats(&p)?,
        None => Vec::new(),
    };
    let strategy = match optional(&paths.strategy) {
        Some(p) => load_strategy(&p)?,
        None => StrategyFile::default(),
    };

    let data = assemble(
        heroes,
        synergy_rows,
        counter_rows,
        pool_history,
        first_picks,
        threats,
        strategy,
        our_side,
    );
    info!(
        "Loaded reference data: {} heroes, {} synergy pairs, {} matchups",
        data.heroes.len(),
        data.synergy.len(),
        data.counters.len()
    );
    Ok(data)
}

/// Build `ReferenceData`, dropping rows that name heroes missing from the
/// roster.
#[allow(clippy::too_many_arguments)]
pub fn assemble(
    heroes: HeroPool,
    synergy_rows: Vec<(HeroId, HeroId, f64)>,
    counter_rows: Vec<(HeroId, HeroId, f64)>,
    mut pool_history: HashMap<HeroId, u32>,
    mut first_picks: Vec<FirstPickPreference>,
    mut threats: Vec<EnemyThreat>,
    strategy: StrategyFile,
    our_side: Option<Side>,
) -> ReferenceData {
    let known = |id: &HeroId, table: &str| -> bool {
        let ok = heroes.contains(*id);
        if !ok {
            warn!("dropping {} entry for unknown hero {}", table, id);
        }
        ok
    };

    let mut synergy = SynergyTable::new();
    for (a, b, score) in synergy_rows {
        if known(&a, "synergy") && known(&b, "synergy") {
            synergy.insert(a, b, score);
        }
    }
    let mut counters = CounterTable::new();
    for (hero, opponent, wr) in counter_rows {
        if known(&hero, "counter") && known(&opponent, "counter") {
            counters.insert(hero, opponent, wr);
        }
    }
    pool_history.retain(|id, _| known(id, "team pool"));
    first_picks.retain(|p| known(&p.hero, "first pick"));
    threats.retain(|t| known(&t.hero, "threat"));

    let keep = |set: BTreeSet<HeroId>, table: &str| -> BTreeSet<HeroId> {
        set.into_iter().filter(|id| known(id, table)).collect()
    };
    let team = TeamProfile {
        side: our_side,
        pool_history,
        first_pick_prefs: first_picks,
        enemy_threats: threats,
        strategy: Strategy {
            core: keep(strategy.core, "strategy core"),
            avoid: keep(strategy.avoid, "strategy avoid"),
        },
        global_bans: GlobalBans {
            blue: keep(strategy.global_bans.blue, "global ban"),
            red: keep(strategy.global_bans.red, "global ban"),
        },
    };

    ReferenceData {
        heroes,
        synergy,
        counters,
        team,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hero::Role;

    #[test]
    fn hero_csv_parses_roles_and_tiers() {
        let csv_data = "\
id,name,roles,tier,win_rate,patch
1,Aldous,EXP Lane/Jungle,S,53.1,1.8
2,Lylia,Mid,a,49.5,1.8
3,Moskov,Gold Lane,,51.0,1.8";
        let heroes = load_heroes_from_reader(csv_data.as_bytes(), &RoleAliases::new()).unwrap();
        assert_eq!(heroes.len(), 3);
        assert_eq!(heroes[0].roles, vec![Role::Exp, Role::Jungle]);
        assert_eq!(heroes[0].tier, Tier::S);
        assert_eq!(heroes[1].tier, Tier::A);
        assert_eq!(heroes[2].tier, Tier::B);
    }

    #[test]
    fn hero_rows_with_unknown_roles_or_bad_numbers_skipped() {
        let csv_data = "\
id,name,roles,tier,win_rate
1,Good,Roam,B,50.0
2,Wizard,Wizard,B,50.0
x,Broken,Mid,B,50.0
4,NoRate,Mid,B,not_a_number
5,Also Good,Support,C,47.0";
        let heroes = load_heroes_from_reader(csv_data.as_bytes(), &RoleAliases::new()).unwrap();
        let names: Vec<&str> = heroes.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Good", "Also Good"]);
        assert_eq!(heroes[1].roles, vec![Role::Roam]);
    }

    #[test]
    fn configured_role_alias_used_by_loader() {
        let mut aliases = RoleAliases::new();
        aliases.insert("tank", Role::Roam);
        let csv_data = "id,name,roles,tier,win_rate\n1,Tigreal,Tank,B,50.0\n";
        let heroes = load_heroes_from_reader(csv_data.as_bytes(), &aliases).unwrap();
        assert_eq!(heroes[0].roles, vec![Role::Roam]);
    }

    #[test]
    fn team_pool_sums_duplicates() {
        let csv_data = "hero_id,matches_played\n3,4\n3,2\n5,1\n";
        let pool = load_team_pool_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(pool[&HeroId(3)], 6);
        assert_eq!(pool[&HeroId(5)], 1);
    }

    #[test]
    fn pair_tables_parse() {
        let synergy = load_synergy_from_reader("hero_a,hero_b,score\n1,2,15.5\n".as_bytes()).unwrap();
        assert_eq!(synergy, vec![(HeroId(1), HeroId(2), 15.5)]);
        let counters =
            load_counters_from_reader("hero,opponent,win_rate\n1,2,58\n2,1,oops\n".as_bytes()).unwrap();
        assert_eq!(counters, vec![(HeroId(1), HeroId(2), 58.0)]);
    }

    #[test]
    fn preference_lists_keep_file_order() {
        let picks = load_first_picks_from_reader(
            "hero_id,win_rate,pick_count\n7,61.0,9\n2,55.0,12\n".as_bytes(),
        )
        .unwrap();
        assert_eq!(picks[0].hero, HeroId(7));
        assert_eq!(picks[1].pick_count, 12);

        let threats =
            load_threats_from_reader("hero_id,win_rate,threat_level\n4,60,3\n".as_bytes()).unwrap();
        assert_eq!(threats[0].threat_level, 3.0);
    }

    #[test]
    fn strategy_toml_parses() {
        let s: StrategyFile = toml::from_str(
            "core = [1, 2]\navoid = [9]\n\n[global_bans]\nblue = [4]\nred = []\n",
        )
        .unwrap();
        assert!(s.core.contains(&HeroId(2)));
        assert!(s.avoid.contains(&HeroId(9)));
        assert!(s.global_bans.blue.contains(&HeroId(4)));
        assert!(s.global_bans.red.is_empty());
    }

    #[test]
    fn assemble_drops_unknown_heroes() {
        let heroes = HeroPool::new(vec![
            Hero {
                id: HeroId(1),
                name: "A".into(),
                roles: vec![Role::Mid],
                tier: Tier::B,
                win_rate: 50.0,
            },
            Hero {
                id: HeroId(2),
                name: "B".into(),
                roles: vec![Role::Gold],
                tier: Tier::B,
                win_rate: 50.0,
            },
        ]);
        let strategy = StrategyFile {
            core: [HeroId(1), HeroId(99)].into_iter().collect(),
            ..StrategyFile::default()
        };
        let data = assemble(
            heroes,
            vec![(HeroId(1), HeroId(2), 10.0), (HeroId(1), HeroId(42), 10.0)],
            vec![(HeroId(42), HeroId(1), 60.0)],
            HashMap::from([(HeroId(2), 3), (HeroId(77), 5)]),
            Vec::new(),
            Vec::new(),
            strategy,
            Some(Side::Red),
        );
        assert_eq!(data.synergy.len(), 1);
        assert!(data.counters.is_empty());
        assert_eq!(data.team.pool_history.len(), 1);
        assert_eq!(data.team.strategy.core.len(), 1);
        assert_eq!(data.team.side, Some(Side::Red));
    }

    #[test]
    fn resolved_paths_join_base() {
        let paths = DataPaths::default().resolved(Path::new("/srv/pickcast"));
        assert_eq!(paths.heroes, "/srv/pickcast/data/heroes.csv");
        assert_eq!(paths.strategy.as_deref(), Some("/srv/pickcast/config/strategy.toml"));
    }
}
