//! Category vocabulary: product type names, benefits and applications.

/// Product type noun per category.
static PRODUCT_TYPES: [(&str, &str); 25] = [
    ("Access Equipment", "Access Platform"),
    ("Air Compressors & Tools", "Air Compressor"),
    ("Breaking & Drilling", "Breaker"),
    ("Cleaning Equipment", "Cleaner"),
    ("Compaction Equipment", "Compactor"),
    ("Concrete Equipment", "Concrete Mixer"),
    ("Cutting & Grinding", "Cutter"),
    ("Dehumidifiers", "Dehumidifier"),
    ("Electrical Equipment", "Electrical Tool"),
    ("Fans & Ventilation", "Fan"),
    ("Floor Care", "Floor Sander"),
    ("Garden Equipment", "Garden Tool"),
    ("Generators", "Generator"),
    ("Hand Tools", "Hand Tool"),
    ("Heating", "Heater"),
    ("Lifting Equipment", "Lifting Equipment"),
    ("Lighting", "Light"),
    ("Power Tools", "Power Tool"),
    ("Pumps", "Pump"),
    ("Safety Equipment", "Safety Equipment"),
    ("Site Equipment", "Site Equipment"),
    ("Temporary Structures", "Temporary Structure"),
    ("Testing Equipment", "Testing Equipment"),
    ("Waste Management", "Waste Equipment"),
    ("Welding Equipment", "Welder"),
];

static DEFAULT_TYPE: &str = "Equipment";

type Phrases = [&'static str; 4];

static BENEFITS: [(&str, &Phrases); 5] = [
    (
        "Access Equipment",
        &[
            "Safe working at height solutions",
            "Stable platform for elevated work",
            "Professional access capabilities",
            "Enhanced safety features and stability",
        ],
    ),
    (
        "Breaking & Drilling",
        &[
            "Powerful breaking and drilling performance",
            "Efficient demolition capabilities",
            "Precision drilling for various materials",
            "Robust construction for heavy-duty applications",
        ],
    ),
    (
        "Cleaning Equipment",
        &[
            "Superior cleaning performance",
            "Efficient dirt and debris removal",
            "Professional cleaning results",
            "Time-saving cleaning solutions",
        ],
    ),
    (
        "Generators",
        &[
            "Reliable portable power generation",
            "Consistent electrical supply",
            "Professional power solutions",
            "Dependable backup power capabilities",
        ],
    ),
    (
        "Garden Equipment",
        &[
            "Professional garden maintenance capabilities",
            "Efficient outdoor project solutions",
            "Superior garden care performance",
            "Professional landscaping results",
        ],
    ),
];

static DEFAULT_BENEFITS: Phrases = [
    "Professional performance and reliability",
    "Efficient operation for demanding applications",
    "Superior results for your projects",
    "Trusted performance by professionals",
];

static APPLICATIONS: [(&str, &Phrases); 5] = [
    (
        "Access Equipment",
        &[
            "building maintenance",
            "construction projects",
            "installation work",
            "painting and decorating",
        ],
    ),
    (
        "Breaking & Drilling",
        &[
            "demolition work",
            "concrete breaking",
            "road repairs",
            "construction projects",
        ],
    ),
    (
        "Cleaning Equipment",
        &[
            "deep cleaning projects",
            "surface preparation",
            "maintenance cleaning",
            "restoration work",
        ],
    ),
    (
        "Generators",
        &[
            "outdoor events",
            "construction sites",
            "emergency backup power",
            "remote locations",
        ],
    ),
    (
        "Garden Equipment",
        &[
            "landscaping projects",
            "garden maintenance",
            "grounds keeping",
            "outdoor renovations",
        ],
    ),
];

static DEFAULT_APPLICATIONS: Phrases = [
    "professional applications",
    "commercial projects",
    "maintenance work",
    "construction tasks",
];

fn lookup<T: ?Sized>(
    table: &'static [(&'static str, &'static T)],
    category: &str,
    default: &'static T,
) -> &'static T {
    table
        .iter()
        .find(|(name, _)| *name == category)
        .map_or(default, |(_, value)| *value)
}

/// Singular product noun for a category, `"Equipment"` when unmapped.
pub fn product_type(category: &str) -> &'static str {
    lookup::<str>(&PRODUCT_TYPES, category, DEFAULT_TYPE)
}

/// Benefit bullets used when the description yields no features.
pub fn benefits(category: &str) -> &'static [&'static str] {
    lookup::<Phrases>(&BENEFITS, category, &DEFAULT_BENEFITS)
}

/// Typical uses, phrased to follow "Ideal for".
pub fn applications(category: &str) -> &'static [&'static str] {
    lookup::<Phrases>(&APPLICATIONS, category, &DEFAULT_APPLICATIONS)
}
