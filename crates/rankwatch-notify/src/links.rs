//! Third-party profile links.
//!
//! Each site uses its own region slugs; regions a site does not serve get
//! no link. The Riot ID is turned into a `name-tag` slug and
//! percent-encoded as a single path segment.

use crate::content::LinkButton;
use rankwatch_core::{Region, RiotId};
use reqwest::Url;

const OPGG_BASE: &str = "https://op.gg/lol/summoners";
const DEEPLOL_BASE: &str = "https://www.deeplol.gg/summoner";

fn opgg_region(region: Region) -> Option<&'static str> {
    let slug = match region {
        Region::Br1 => "br",
        Region::Eun1 => "eune",
        Region::Euw1 => "euw",
        Region::Jp1 => "jp",
        Region::Kr => "kr",
        Region::La1 => "lan",
        Region::La2 => "las",
        Region::Me1 => "me",
        Region::Na1 => "na",
        Region::Oc1 => "oce",
        Region::Ph2 => "ph",
        Region::Ru => "ru",
        Region::Sg2 => "sg",
        Region::Th2 => "th",
        Region::Tr1 => "tr",
        Region::Tw2 => "tw",
        Region::Vn2 => "vn",
    };
    Some(slug)
}

fn deeplol_region(region: Region) -> Option<&'static str> {
    match region {
        Region::Br1 => Some("BR"),
        Region::Eun1 => Some("EUN"),
        Region::Euw1 => Some("EUW"),
        Region::Jp1 => Some("JP"),
        Region::Kr => Some("KR"),
        Region::La1 => Some("LAN"),
        Region::La2 => Some("LAS"),
        Region::Na1 => Some("NA"),
        Region::Oc1 => Some("OCE"),
        Region::Ru => Some("RU"),
        Region::Tr1 => Some("TR"),
        Region::Tw2 => Some("TW"),
        Region::Vn2 => Some("VN"),
        Region::Sg2 => Some("SG"),
        Region::Me1 | Region::Ph2 | Region::Th2 => None,
    }
}

fn build(base: &str, region_slug: &str, riot_id: &RiotId) -> Option<String> {
    let mut url = Url::parse(base).ok()?;
    url.path_segments_mut()
        .ok()?
        .push(region_slug)
        .push(&riot_id.profile_slug());
    Some(url.to_string())
}

pub fn opgg_link(riot_id: &RiotId, region: Region) -> Option<String> {
    build(OPGG_BASE, opgg_region(region)?, riot_id)
}

pub fn deeplol_link(riot_id: &RiotId, region: Region) -> Option<String> {
    build(DEEPLOL_BASE, deeplol_region(region)?, riot_id)
}

/// Link buttons for every site serving `region`.
pub fn profile_links(riot_id: &RiotId, region: Region) -> Vec<LinkButton> {
    [
        ("OP.GG", opgg_link(riot_id, region)),
        ("DeepLoL", deeplol_link(riot_id, region)),
    ]
    .into_iter()
    .filter_map(|(label, url)| {
        url.map(|url| LinkButton {
            label: label.to_string(),
            url,
        })
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opgg_link_encodes_slug() {
        let id = RiotId::new("Some One", "euw");
        assert_eq!(
            opgg_link(&id, Region::Euw1).as_deref(),
            Some("https://op.gg/lol/summoners/euw/Some%20One-euw")
        );
    }

    #[test]
    fn test_deeplol_link_uses_site_region() {
        let id = RiotId::new("Faker", "kr1");
        assert_eq!(
            deeplol_link(&id, Region::Kr).as_deref(),
            Some("https://www.deeplol.gg/summoner/KR/Faker-kr1")
        );
    }

    #[test]
    fn test_unsupported_region_has_no_link() {
        let id = RiotId::new("Player", "th");
        assert!(deeplol_link(&id, Region::Th2).is_none());
        let links = profile_links(&id, Region::Th2);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].label, "OP.GG");
    }

    #[test]
    fn test_every_region_has_an_opgg_link() {
        let id = RiotId::new("Player", "tag");
        for region in Region::ALL {
            assert!(opgg_link(&id, region).is_some(), "{region}");
        }
    }

    #[test]
    fn test_slash_in_name_stays_in_one_segment() {
        let id = RiotId::new("a/b", "x");
        let link = opgg_link(&id, Region::Na1).unwrap();
        assert!(link.ends_with("/na/a%2Fb-x"));
    }
}
