//! SHELX instruction vocabulary.
//!
//! The keyword lists are a contract with the refinement program that reads
//! stored restraints back; they are kept verbatim.

use std::fmt::{Display, Formatter};

macro_rules! instruction_cards {
    ($($variant:ident => $text:literal),+ $(,)?) => {
        /// One SHELX instruction keyword.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum RestraintCard {
            $($variant),+
        }

        impl RestraintCard {
            /// All known instruction keywords in SHELX manual order.
            pub const ALL: &'static [RestraintCard] = &[$(RestraintCard::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(RestraintCard::$variant => $text),+
                }
            }

            /// Exact, case-sensitive keyword lookup.
            pub fn from_keyword(keyword: &str) -> Option<Self> {
                match keyword {
                    $($text => Some(RestraintCard::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

instruction_cards! {
    Titl => "TITL", Cell => "CELL", Zerr => "ZERR", Latt => "LATT", Symm => "SYMM",
    Sfac => "SFAC", Unit => "UNIT", List => "LIST", Ls => "L.S.", Cgls => "CGLS",
    Bond => "BOND", Fmap => "FMAP", Plan => "PLAN", Temp => "TEMP", Acta => "ACTA",
    Conf => "CONF", Simu => "SIMU", Rigu => "RIGU", Wght => "WGHT", Fvar => "FVAR",
    Delu => "DELU", Same => "SAME", Disp => "DISP", Laue => "LAUE", Rem => "REM",
    More => "MORE", Time => "TIME", End => "END", Hklf => "HKLF", Omit => "OMIT",
    Shel => "SHEL", Basf => "BASF", Twin => "TWIN", Exti => "EXTI", Swat => "SWAT",
    Hope => "HOPE", Merg => "MERG", Spec => "SPEC", Resi => "RESI", Move => "MOVE",
    Anis => "ANIS", Afix => "AFIX", Hfix => "HFIX", Frag => "FRAG", Fend => "FEND",
    Exyz => "EXYZ", Eadp => "EADP", Eqiv => "EQIV", Conn => "CONN", Bind => "BIND",
    Free => "FREE", Dfix => "DFIX", Bump => "BUMP", Sadi => "SADI", Chiv => "CHIV",
    Flat => "FLAT", Defs => "DEFS", Isor => "ISOR", Ncsy => "NCSY", Sump => "SUMP",
    Bloc => "BLOC", Damp => "DAMP", Stir => "STIR", Mpla => "MPLA", Rtab => "RTAB",
    Htab => "HTAB", Size => "SIZE", Wpdb => "WPDB", Grid => "GRID", Mole => "MOLE",
    Xnpd => "XNPD", Rest => "REST", Chan => "CHAN", Flap => "FLAP", Rnum => "RNUM",
    Socc => "SOCC", Prig => "PRIG", Wigl => "WIGL", Rang => "RANG", Tang => "TANG",
    Adda => "ADDA", Stag => "STAG", Neut => "NEUT", Abin => "ABIN", Ansc => "ANSC",
    Ansr => "ANSR", Notr => "NOTR", Twst => "TWST", Part => "PART", Dang => "DANG",
}

/// Cards whose atom lists must name atoms of the owning fragment.
const GEOMETRIC_RESTRAINTS: [RestraintCard; 15] = [
    RestraintCard::Simu,
    RestraintCard::Rigu,
    RestraintCard::Delu,
    RestraintCard::Same,
    RestraintCard::Free,
    RestraintCard::Dfix,
    RestraintCard::Bump,
    RestraintCard::Hfix,
    RestraintCard::Sadi,
    RestraintCard::Chiv,
    RestraintCard::Flat,
    RestraintCard::Defs,
    RestraintCard::Isor,
    RestraintCard::Ncsy,
    RestraintCard::Dang,
];

impl RestraintCard {
    /// Looks up the keyword of a restraint line token.
    ///
    /// Only the first four characters count and case is ignored, so
    /// `"sadi_cf3"` resolves to [`RestraintCard::Sadi`].
    pub fn parse(token: &str) -> Option<Self> {
        let keyword = token.chars().take(4).collect::<String>().to_uppercase();
        Self::from_keyword(&keyword)
    }

    pub fn is_restraint(self) -> bool {
        GEOMETRIC_RESTRAINTS.contains(&self)
    }
}

impl Display for RestraintCard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
