//! Named HTML character references for non-ASCII text.
//!
//! Covers the Latin-1 supplement and the common typographic characters.

/// Sorted by code point.
const NAMED: &[(char, &str)] = &[
    ('\u{a0}', "nbsp"),
    ('\u{a1}', "iexcl"),
    ('\u{a2}', "cent"),
    ('\u{a3}', "pound"),
    ('\u{a4}', "curren"),
    ('\u{a5}', "yen"),
    ('\u{a6}', "brvbar"),
    ('\u{a7}', "sect"),
    ('\u{a8}', "uml"),
    ('\u{a9}', "copy"),
    ('\u{aa}', "ordf"),
    ('\u{ab}', "laquo"),
    ('\u{ac}', "not"),
    ('\u{ad}', "shy"),
    ('\u{ae}', "reg"),
    ('\u{af}', "macr"),
    ('\u{b0}', "deg"),
    ('\u{b1}', "plusmn"),
    ('\u{b2}', "sup2"),
    ('\u{b3}', "sup3"),
    ('\u{b4}', "acute"),
    ('\u{b5}', "micro"),
    ('\u{b6}', "para"),
    ('\u{b7}', "middot"),
    ('\u{b8}', "cedil"),
    ('\u{b9}', "sup1"),
    ('\u{ba}', "ordm"),
    ('\u{bb}', "raquo"),
    ('\u{bc}', "frac14"),
    ('\u{bd}', "frac12"),
    ('\u{be}', "frac34"),
    ('\u{bf}', "iquest"),
    ('\u{c0}', "Agrave"),
    ('\u{c1}', "Aacute"),
    ('\u{c2}', "Acirc"),
    ('\u{c3}', "Atilde"),
    ('\u{c4}', "Auml"),
    ('\u{c5}', "Aring"),
    ('\u{c6}', "AElig"),
    ('\u{c7}', "Ccedil"),
    ('\u{c8}', "Egrave"),
    ('\u{c9}', "Eacute"),
    ('\u{ca}', "Ecirc"),
    ('\u{cb}', "Euml"),
    ('\u{cc}', "Igrave"),
    ('\u{cd}', "Iacute"),
    ('\u{ce}', "Icirc"),
    ('\u{cf}', "Iuml"),
    ('\u{d0}', "ETH"),
    ('\u{d1}', "Ntilde"),
    ('\u{d2}', "Ograve"),
    ('\u{d3}', "Oacute"),
    ('\u{d4}', "Ocirc"),
    ('\u{d5}', "Otilde"),
    ('\u{d6}', "Ouml"),
    ('\u{d7}', "times"),
    ('\u{d8}', "Oslash"),
    ('\u{d9}', "Ugrave"),
    ('\u{da}', "Uacute"),
    ('\u{db}', "Ucirc"),
    ('\u{dc}', "Uuml"),
    ('\u{dd}', "Yacute"),
    ('\u{de}', "THORN"),
    ('\u{df}', "szlig"),
    ('\u{e0}', "agrave"),
    ('\u{e1}', "aacute"),
    ('\u{e2}', "acirc"),
    ('\u{e3}', "atilde"),
    ('\u{e4}', "auml"),
    ('\u{e5}', "aring"),
    ('\u{e6}', "aelig"),
    ('\u{e7}', "ccedil"),
    ('\u{e8}', "egrave"),
    ('\u{e9}', "eacute"),
    ('\u{ea}', "ecirc"),
    ('\u{eb}', "euml"),
    ('\u{ec}', "igrave"),
    ('\u{ed}', "iacute"),
    ('\u{ee}', "icirc"),
    ('\u{ef}', "iuml"),
    ('\u{f0}', "eth"),
    ('\u{f1}', "ntilde"),
    ('\u{f2}', "ograve"),
    ('\u{f3}', "oacute"),
    ('\u{f4}', "ocirc"),
    ('\u{f5}', "otilde"),
    ('\u{f6}', "ouml"),
    ('\u{f7}', "divide"),
    ('\u{f8}', "oslash"),
    ('\u{f9}', "ugrave"),
    ('\u{fa}', "uacute"),
    ('\u{fb}', "ucirc"),
    ('\u{fc}', "uuml"),
    ('\u{fd}', "yacute"),
    ('\u{fe}', "thorn"),
    ('\u{ff}', "yuml"),
    ('\u{152}', "OElig"),
    ('\u{153}', "oelig"),
    ('\u{160}', "Scaron"),
    ('\u{161}', "scaron"),
    ('\u{178}', "Yuml"),
    ('\u{192}', "fnof"),
    ('\u{2c6}', "circ"),
    ('\u{2dc}', "tilde"),
    ('\u{2013}', "ndash"),
    ('\u{2014}', "mdash"),
    ('\u{2018}', "lsquo"),
    ('\u{2019}', "rsquo"),
    ('\u{201a}', "sbquo"),
    ('\u{201c}', "ldquo"),
    ('\u{201d}', "rdquo"),
    ('\u{201e}', "bdquo"),
    ('\u{2020}', "dagger"),
    ('\u{2021}', "Dagger"),
    ('\u{2022}', "bull"),
    ('\u{2026}', "hellip"),
    ('\u{2030}', "permil"),
    ('\u{2032}', "prime"),
    ('\u{2033}', "Prime"),
    ('\u{2039}', "lsaquo"),
    ('\u{203a}', "rsaquo"),
    ('\u{20ac}', "euro"),
    ('\u{2122}', "trade"),
];

/// Name of the character reference for `ch`, without `&` and `;`.
#[must_use]
pub fn named_entity(ch: char) -> Option<&'static str> {
    NAMED
        .binary_search_by_key(&ch, |(named, _)| *named)
        .ok()
        .map(|index| NAMED[index].1)
}
