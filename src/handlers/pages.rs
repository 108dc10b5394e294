//! Copy for the localized public pages.

/// One public page in one language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCopy {
    pub title: &'static str,
    pub heading: &'static str,
    pub lead: &'static str,
    pub body: &'static str,
}

/// Public page slugs in navigation order. The empty slug is the home page.
pub const PAGE_SLUGS: [&str; 4] = ["", "portfolio", "about", "contact"];

/// Navigation label for a slug
pub fn nav_label(slug: &str, locale: &str) -> &'static str {
    match (slug, locale) {
        ("", "fr") => "Accueil",
        ("", _) => "Home",
        ("portfolio", _) => "Portfolio",
        ("about", "fr") => "Le studio",
        ("about", _) => "The studio",
        ("contact", _) => "Contact",
        _ => "",
    }
}

pub fn page_copy(slug: &str, locale: &str) -> Option<PageCopy> {
    let copy = match (slug, locale) {
        ("", "fr") => PageCopy {
            title: "Studio UB",
            heading: "Studio UB",
            lead: "Images, sons et signaux analogiques.",
            body: "Un studio de création qui mélange vidéo, musique et interfaces rétro.",
        },
        ("", "en") => PageCopy {
            title: "Studio UB",
            heading: "Studio UB",
            lead: "Pictures, sound and analog signals.",
            body: "A creative studio mixing video, music and retro interfaces.",
        },
        ("portfolio", "fr") => PageCopy {
            title: "Portfolio | Studio UB",
            heading: "Portfolio",
            lead: "Une sélection de projets récents.",
            body: "Clips, identités sonores et installations. Chaque projet a sa propre cassette.",
        },
        ("portfolio", "en") => PageCopy {
            title: "Portfolio | Studio UB",
            heading: "Portfolio",
            lead: "A selection of recent work.",
            body: "Music videos, sound identities and installations. Every project gets its own tape.",
        },
        ("about", "fr") => PageCopy {
            title: "Le studio | Studio UB",
            heading: "Le studio",
            lead: "Deux personnes, un magnétoscope et beaucoup de câbles.",
            body: "Nous travaillons entre Paris et Lyon, en français comme en anglais.",
        },
        ("about", "en") => PageCopy {
            title: "The studio | Studio UB",
            heading: "The studio",
            lead: "Two people, one VCR and a lot of cables.",
            body: "We work between Paris and Lyon, in French and in English.",
        },
        ("contact", "fr") => PageCopy {
            title: "Contact | Studio UB",
            heading: "Contact",
            lead: "Un projet en tête ?",
            body: "Écrivez-nous à bonjour@studio-ub.fr.",
        },
        ("contact", "en") => PageCopy {
            title: "Contact | Studio UB",
            heading: "Contact",
            lead: "Got a project in mind?",
            body: "Write to us at bonjour@studio-ub.fr.",
        },
        _ => return None,
    };
    Some(copy)
}
