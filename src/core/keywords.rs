/// One row of the static profession table
#[derive(Debug, Clone, Copy)]
pub struct ProfessionKeywords {
    pub profession: &'static str,
    /// Single-word keywords match whole tokens; multi-word phrases match
    /// by substring on the normalized query. All entries are lowercase.
    pub keywords: &'static [&'static str],
}

/// Profession -> keyword/synonym table for the heuristic classifier.
///
/// Table order is the tie-break when two professions score equally, so the
/// more commonly requested crafts come first.
pub const PROFESSION_KEYWORDS: &[ProfessionKeywords] = &[
    ProfessionKeywords {
        profession: "pottery",
        keywords: &[
            "pottery",
            "potter",
            "clay",
            "ceramic",
            "ceramics",
            "kiln",
            "terracotta",
            "stoneware",
            "earthenware",
            "porcelain",
            "glaze",
            "glazed",
            "traditional",
            "wheel throwing",
        ],
    },
    ProfessionKeywords {
        profession: "woodworking",
        keywords: &[
            "woodworking",
            "woodworker",
            "wood",
            "wooden",
            "carpentry",
            "carpenter",
            "furniture",
            "carving",
            "woodcarving",
            "joinery",
            "cabinet",
            "timber",
            "hardwood",
            "hand carved",
        ],
    },
    ProfessionKeywords {
        profession: "weaving",
        keywords: &[
            "weaving",
            "weaver",
            "woven",
            "textile",
            "textiles",
            "loom",
            "fabric",
            "tapestry",
            "yarn",
            "wool",
            "embroidery",
            "knitting",
            "hand loom",
        ],
    },
    ProfessionKeywords {
        profession: "blacksmithing",
        keywords: &[
            "blacksmithing",
            "blacksmith",
            "forge",
            "forged",
            "iron",
            "ironwork",
            "metalwork",
            "anvil",
            "wrought",
            "steel",
            "hand forged",
        ],
    },
    ProfessionKeywords {
        profession: "jewelry",
        keywords: &[
            "jewelry",
            "jeweler",
            "necklace",
            "bracelet",
            "earrings",
            "gemstone",
            "silver",
            "gold",
            "beads",
            "pendant",
            "silversmith",
            "goldsmith",
        ],
    },
    ProfessionKeywords {
        profession: "leatherwork",
        keywords: &[
            "leatherwork",
            "leather",
            "hide",
            "tanning",
            "saddle",
            "belt",
            "wallet",
            "cobbler",
            "hand stitched",
        ],
    },
    ProfessionKeywords {
        profession: "glassblowing",
        keywords: &[
            "glassblowing",
            "glassblower",
            "glass",
            "glassware",
            "vase",
            "lampworking",
            "stained glass",
            "blown glass",
        ],
    },
    ProfessionKeywords {
        profession: "basketry",
        keywords: &[
            "basketry",
            "basket",
            "baskets",
            "wicker",
            "rattan",
            "willow",
            "basket weaving",
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_normalized() {
        for entry in PROFESSION_KEYWORDS {
            assert!(!entry.profession.is_empty());
            assert_eq!(entry.profession, entry.profession.to_lowercase());
            assert!(!entry.keywords.is_empty());
            for kw in entry.keywords {
                assert_eq!(*kw, kw.to_lowercase(), "keyword not lowercase: {}", kw);
                assert_eq!(*kw, kw.trim(), "keyword not trimmed: {}", kw);
            }
        }
    }

    #[test]
    fn test_professions_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for entry in PROFESSION_KEYWORDS {
            assert!(seen.insert(entry.profession), "duplicate: {}", entry.profession);
        }
    }

    #[test]
    fn test_pottery_table_backs_common_queries() {
        let pottery = PROFESSION_KEYWORDS
            .iter()
            .find(|e| e.profession == "pottery")
            .unwrap();
        assert!(pottery.keywords.contains(&"pottery"));
        assert!(pottery.keywords.contains(&"traditional"));
    }
}
