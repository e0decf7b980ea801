//! Fixture dictionaries for pseudonym generation. Read-only, loaded once.
//!
//! Names skew common-but-generic so generated text reads naturally without
//! pointing at anyone in particular; street/city/org lists are invented.

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub static FIRST_NAMES: &[&str] = &[
    "Alan", "Amy", "Andrew", "Anna", "Arthur", "Beth", "Brian", "Carla", "Carol", "Chris",
    "Clara", "Colin", "Dana", "David", "Dennis", "Diane", "Donald", "Doris", "Edward",
    "Elaine", "Eric", "Erin", "Ethan", "Evan", "Faith", "Frank", "Gail", "Gavin", "Gerald",
    "Glenn", "Grace", "Harold", "Helen", "Henry", "Irene", "Ivan", "Janet", "Jason", "Jean",
    "Joan", "Joel", "Karen", "Keith", "Kevin", "Laura", "Leon", "Lewis", "Linda", "Lloyd",
    "Louis", "Marc", "Maria", "Marie", "Mark", "Martha", "Megan", "Nancy", "Neil", "Nora",
    "Norman", "Olive", "Oscar", "Paula", "Peter", "Philip", "Rachel", "Ralph", "Rhoda",
    "Rita", "Roger", "Rosa", "Ross", "Roy", "Ruth", "Sara", "Scott", "Sean", "Stan",
    "Susan", "Tara", "Terry", "Tina", "Todd", "Vera", "Victor", "Wade", "Walter", "Wendy",
];

pub static LAST_NAMES: &[&str] = &[
    "Abbott", "Archer", "Barnes", "Barton", "Bauer", "Becker", "Bennett", "Berger", "Bishop",
    "Blake", "Boone", "Bowers", "Boyd", "Brandt", "Brewer", "Briggs", "Brooks", "Burke",
    "Burns", "Carver", "Chandler", "Clarke", "Cole", "Conway", "Cooper", "Crane", "Curtis",
    "Dalton", "Dawson", "Dean", "Dixon", "Donovan", "Doyle", "Drake", "Duncan", "Ellis",
    "Fisher", "Fleming", "Foster", "Fowler", "Garner", "Gibson", "Graham", "Grant", "Greer",
    "Hale", "Hardy", "Harmon", "Harper", "Hayes", "Holden", "Hopkins", "Howell", "Hubbard",
    "Hudson", "Ingram", "Jarvis", "Keller", "Kemp", "Kendall", "Kerr", "Lambert", "Lane",
    "Larsen", "Mason", "Mercer", "Meyer", "Monroe", "Morton", "Nash", "Nolan", "Norris",
    "Olsen", "Osborne", "Parker", "Payne", "Porter", "Potter", "Pratt", "Quinn", "Ramsey",
    "Reeves", "Riley", "Rowe", "Sawyer", "Schmidt", "Sherman", "Slater", "Sloan", "Spencer",
    "Stanton", "Steele", "Stone", "Sutton", "Tanner", "Thorne", "Tucker", "Vaughn", "Walsh",
    "Walton", "Warner", "Watts", "Weaver", "Webster", "Wheeler", "Whitaker", "Wilcox",
    "Winters", "Woods",
];

pub static STREET_NAMES: &[&str] = &[
    "Alder", "Aspen", "Birchwood", "Bramble", "Brookfield", "Cedar Ridge", "Chestnut",
    "Clearwater", "Cobblestone", "Coldbrook", "Copperfield", "Dogwood", "Driftwood",
    "Eastbrook", "Elmhurst", "Fernwood", "Foxglove", "Glenhaven", "Greenbriar", "Harvest",
    "Hawthorne", "Hazelwood", "Hickory", "Hillcrest", "Ironwood", "Juniper", "Kingfisher",
    "Lakeview", "Larchmont", "Laurel", "Magnolia", "Maplewood", "Meadowbrook", "Mulberry",
    "Northgate", "Oakdale", "Orchard", "Pinecrest", "Primrose", "Ridgeway", "Rosewood",
    "Sagebrush", "Shadowbrook", "Silverleaf", "Springhill", "Stonebridge", "Sycamore",
    "Tamarack", "Thornbury", "Westfield", "Willowbrook", "Windmere",
];

pub static CITY_NAMES: &[&str] = &[
    "Ashford", "Bellbrook", "Brockton", "Cedarville", "Clarksburg", "Crestwood", "Dunmore",
    "Eastvale", "Fairhaven", "Glenrock", "Granville", "Greenfield", "Harborview", "Kingsley",
    "Lakemont", "Marlowe", "Millbrook", "Northfield", "Oakhurst", "Pinehurst", "Redfield",
    "Ridgemont", "Riverton", "Rockwell", "Stonehaven", "Summerfield", "Thornton", "Waverly",
    "Westbrook", "Winfield",
];

pub static ORG_ROOTS: &[&str] = &[
    "Alderbrook", "Amberline", "Arborview", "Ashcroft", "Beaconsfield", "Blackstone",
    "Bluecrest", "Brampton", "Briarcliff", "Bridgewater", "Brightmoor", "Cascade",
    "Cedarline", "Claymore", "Clearfield", "Copperline", "Crestline", "Crosswind",
    "Dunbarton", "Eastgate", "Fairmont", "Fernridge", "Flintlock", "Foxhall", "Glenfield",
    "Granite", "Greystone", "Harborline", "Hartwell", "Hawthorne", "Highbridge", "Irongate",
    "Kestrel", "Lakeshore", "Larkspur", "Longford", "Marwood", "Meridian", "Northwind",
    "Oakline", "Pinnacle", "Quarry", "Ravenwood", "Redstone", "Ridgeline", "Rosefield",
    "Silvermont", "Southgate", "Sterling", "Stonegate", "Summit", "Tidewater", "Vantage",
    "Westline", "Whitfield", "Wildrose", "Windham", "Wintergreen",
];

pub static STATE_ABBREVS: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN",
    "IA", "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV",
    "NH", "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN",
    "TX", "UT", "VT", "VA", "WA", "WV", "WI", "WY",
];

/// Length-bucketed first/last name indexes, built once; pseudonym picks
/// filter by length so replacements stay within ±2 chars of the original.
pub static FIRST_BY_LEN: Lazy<HashMap<usize, Vec<&'static str>>> =
    Lazy::new(|| bucket_by_len(FIRST_NAMES));

pub static LAST_BY_LEN: Lazy<HashMap<usize, Vec<&'static str>>> =
    Lazy::new(|| bucket_by_len(LAST_NAMES));

fn bucket_by_len(names: &'static [&'static str]) -> HashMap<usize, Vec<&'static str>> {
    let mut map: HashMap<usize, Vec<&'static str>> = HashMap::new();
    for name in names {
        map.entry(name.len()).or_default().push(name);
    }
    map
}

/// Candidates within `tolerance` of `target_len`, falling back to the whole
/// dictionary when the window is empty.
pub fn length_matched(
    by_len: &'static Lazy<HashMap<usize, Vec<&'static str>>>,
    all: &'static [&'static str],
    target_len: usize,
    tolerance: usize,
) -> Vec<&'static str> {
    let lo = target_len.saturating_sub(tolerance);
    let hi = target_len + tolerance;
    let mut out: Vec<&'static str> = Vec::new();
    for len in lo..=hi {
        if let Some(bucket) = by_len.get(&len) {
            out.extend(bucket.iter().copied());
        }
    }
    if out.is_empty() {
        out.extend(all.iter().copied());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_cover_all_names() {
        let total: usize = FIRST_BY_LEN.values().map(Vec::len).sum();
        assert_eq!(total, FIRST_NAMES.len());
    }

    #[test]
    fn length_matched_respects_window() {
        let picks = length_matched(&LAST_BY_LEN, LAST_NAMES, 5, 2);
        assert!(!picks.is_empty());
        assert!(picks.iter().all(|n| (3..=7).contains(&n.len())));
    }

    #[test]
    fn length_matched_falls_back() {
        let picks = length_matched(&LAST_BY_LEN, LAST_NAMES, 40, 2);
        assert_eq!(picks.len(), LAST_NAMES.len());
    }

    #[test]
    fn fixtures_are_nonempty() {
        for list in [FIRST_NAMES, LAST_NAMES, STREET_NAMES, CITY_NAMES, ORG_ROOTS] {
            assert!(list.len() >= 30);
        }
        assert_eq!(STATE_ABBREVS.len(), 50);
    }
}
