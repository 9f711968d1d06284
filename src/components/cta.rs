use std::str::FromStr;

use serde::Serialize;
use serde_json::json;

use crate::content::{THIRST_IMAGE, THIRST_SECTION, WAITLIST_LABEL, WAITLIST_LINK};
use crate::telemetry::{now_millis, properties, Properties, TelemetryPort};

/// Where a waitlist button sits on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CtaPlacement {
    Header,
    Hero,
    StrategyKit,
    Final,
}

impl CtaPlacement {
    pub fn event_name(self) -> &'static str {
        match self {
            CtaPlacement::Header => "header_cta_click",
            CtaPlacement::Hero => "hero_cta_click",
            CtaPlacement::StrategyKit => "strategy_kit_cta_click",
            CtaPlacement::Final => "final_cta_click",
        }
    }

    fn properties(self) -> Properties {
        match self {
            // The strategy-kit button is the only one that reports its link.
            CtaPlacement::StrategyKit => properties(json!({
                "cta": WAITLIST_LABEL,
                "link": WAITLIST_LINK,
            })),
            _ => properties(json!({ "cta": WAITLIST_LABEL })),
        }
    }
}

impl FromStr for CtaPlacement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "header" => Ok(CtaPlacement::Header),
            "hero" => Ok(CtaPlacement::Hero),
            "strategy_kit" | "strategy-kit" => Ok(CtaPlacement::StrategyKit),
            "final" => Ok(CtaPlacement::Final),
            other => Err(format!("Unknown call to action: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CtaTarget {
    pub label: &'static str,
    pub link: &'static str,
}

/// Records the click and returns where the renderer should send the visitor.
pub fn click_cta(placement: CtaPlacement, telemetry: &dyn TelemetryPort) -> CtaTarget {
    telemetry.capture(placement.event_name(), placement.properties());
    CtaTarget {
        label: WAITLIST_LABEL,
        link: WAITLIST_LINK,
    }
}

pub fn click_thirst_image(telemetry: &dyn TelemetryPort) {
    telemetry.capture(
        "thirst_section_image_click",
        properties(json!({
            "section": THIRST_SECTION,
            "image": THIRST_IMAGE,
        })),
    );
}

pub fn reflection_storage_properties() -> Properties {
    properties(json!({
        "section": THIRST_SECTION,
        "image": THIRST_IMAGE,
        "timestamp": now_millis(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::MemoryTelemetry;

    #[test]
    fn each_placement_has_its_own_event() {
        let telemetry = MemoryTelemetry::new();
        for placement in [
            CtaPlacement::Header,
            CtaPlacement::Hero,
            CtaPlacement::StrategyKit,
            CtaPlacement::Final,
        ] {
            let target = click_cta(placement, &telemetry);
            assert_eq!(target.link, WAITLIST_LINK);
        }
        assert_eq!(
            telemetry.names(),
            vec![
                "header_cta_click",
                "hero_cta_click",
                "strategy_kit_cta_click",
                "final_cta_click"
            ]
        );
        let events = telemetry.events();
        assert_eq!(events[2].properties["link"], WAITLIST_LINK);
        assert!(events[0].properties.get("link").is_none());
        assert_eq!(events[0].properties["cta"], WAITLIST_LABEL);
    }

    #[test]
    fn parses_placements() {
        assert_eq!("hero".parse::<CtaPlacement>(), Ok(CtaPlacement::Hero));
        assert_eq!("strategy-kit".parse::<CtaPlacement>(), Ok(CtaPlacement::StrategyKit));
        assert!("footer".parse::<CtaPlacement>().is_err());
    }

    #[test]
    fn clicks_are_not_deduplicated() {
        let telemetry = MemoryTelemetry::new();
        click_thirst_image(&telemetry);
        click_thirst_image(&telemetry);
        assert_eq!(telemetry.count("thirst_section_image_click"), 2);
        assert_eq!(telemetry.events()[0].properties["image"], THIRST_IMAGE);
    }
}
