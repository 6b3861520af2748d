//! Static ACLS protocol reference data.
//!
//! The Hs & Ts reversible-causes checklist and the rhythm options shown
//! at a rhythm check. Built once and cached.

use crate::types::{HsAndTsItem, Rhythm, RhythmOption};
use once_cell::sync::Lazy;

static HS_AND_TS: Lazy<Vec<HsAndTsItem>> = Lazy::new(|| {
    vec![
        HsAndTsItem { en: "Hypovolemia", cn: "低血容量" },
        HsAndTsItem { en: "Hypoxia", cn: "缺氧" },
        HsAndTsItem { en: "Hydrogen Ion (Acidosis)", cn: "酸中毒" },
        HsAndTsItem { en: "Hypo/Hyperkalemia", cn: "低/高钾血症" },
        HsAndTsItem { en: "Hypothermia", cn: "低体温" },
        HsAndTsItem { en: "Tension Pneumothorax", cn: "张力性气胸" },
        HsAndTsItem { en: "Tamponade, Cardiac", cn: "心包填塞" },
        HsAndTsItem { en: "Toxins", cn: "中毒" },
        HsAndTsItem { en: "Thrombosis, Pulmonary", cn: "肺栓塞" },
        HsAndTsItem { en: "Thrombosis, Coronary", cn: "冠状动脉栓塞" },
    ]
});

static RHYTHM_OPTIONS: Lazy<Vec<RhythmOption>> = Lazy::new(|| {
    vec![
        RhythmOption { rhythm: Rhythm::Vf, label: "VF", sub_cn: "室颤" },
        RhythmOption { rhythm: Rhythm::Pvt, label: "pVT", sub_cn: "无脉室速" },
        RhythmOption { rhythm: Rhythm::Pea, label: "PEA", sub_cn: "无脉电" },
        RhythmOption { rhythm: Rhythm::Asystole, label: "Asystole", sub_cn: "停搏" },
        RhythmOption { rhythm: Rhythm::Rosc, label: "ROSC", sub_cn: "ROSC" },
    ]
});

/// The Hs & Ts checklist of reversible arrest causes
pub fn hs_and_ts() -> &'static [HsAndTsItem] {
    &HS_AND_TS
}

/// Rhythm options in display order
pub fn rhythm_options() -> &'static [RhythmOption] {
    &RHYTHM_OPTIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hs_and_ts_has_five_hs_and_five_ts() {
        let items = hs_and_ts();
        assert_eq!(items.len(), 10);
        assert_eq!(items.iter().filter(|i| i.en.starts_with('H')).count(), 5);
        assert_eq!(items.iter().filter(|i| i.en.starts_with('T')).count(), 5);
    }

    #[test]
    fn test_rhythm_options_cover_all_rhythms() {
        let options = rhythm_options();
        assert_eq!(options.len(), 5);
        for option in options {
            assert_eq!(option.label, option.rhythm.label());
        }
    }
}
