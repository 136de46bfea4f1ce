use pretty_assertions::assert_eq;
use tern_ir::{Context, DeclKind, DeclName, Declaration, NominalKind, NominalPath};

use super::*;

#[test]
fn literal_pattern_matches_whole_name() {
    let pattern = NamePattern::new("Shapes.Circle");
    assert!(pattern.matches("Shapes.Circle"));
    assert!(!pattern.matches("Shapes.Circle.area"));
    assert!(!pattern.matches("Shapes.Circl"));
}

#[test]
fn wildcards() {
    let pattern = NamePattern::new("Shapes.*");
    assert!(pattern.matches("Shapes.Circle"));
    assert!(pattern.matches("Shapes.Circle.area"));
    assert!(pattern.matches("Shapes."));
    assert!(!pattern.matches("Shape"));

    let pattern = NamePattern::new("*.internal*");
    assert!(pattern.matches("Shapes.Circle.internalArea"));
    assert!(!pattern.matches("Shapes.Circle.area"));

    let pattern = NamePattern::new("a*b*b");
    assert!(pattern.matches("abb"));
    assert!(pattern.matches("axxbyyb"));
    assert!(!pattern.matches("ab"));

    assert!(NamePattern::new("*").matches(""));
    assert!(NamePattern::new("").matches(""));
    assert!(!NamePattern::new("").matches("x"));
}

#[test]
fn patterns_are_anchored_and_literal() {
    assert!(!NamePattern::new("Circle").matches("Shapes.Circle.area"));
    assert!(NamePattern::new("*Circle*").matches("Shapes.Circle.area"));
    assert!(!NamePattern::new("Shapes.Circle").matches("ShapesXCircle"));
    assert!(!NamePattern::new("S.*").matches("Shapes.Circle"));

    let filter = NameFilter::new(Vec::<&str>::new(), ["Circle"]);
    assert!(filter.allows("Shapes.Circle.area"));
}

#[test]
fn include_overrides_exclude() {
    let filter = NameFilter::new(["Shapes.Circle.*"], ["Shapes.*"]);
    assert!(filter.allows("Shapes.Circle.area"));
    assert!(!filter.allows("Shapes.Square.area"));
    assert!(filter.allows("Geometry.Point"));
}

#[test]
fn empty_filter_allows_everything() {
    let filter = NameFilter::default();
    assert!(filter.is_empty());
    assert!(filter.allows("anything"));
}

#[test]
fn qualified_names() {
    let mut decl = Declaration::new(
        DeclKind::Method,
        Context::nominal(
            &NominalPath::top_level("Shapes", "Circle"),
            &[NominalKind::Struct],
        ),
    );
    decl.name = Some(DeclName::plain("area"));
    assert_eq!(qualified_name(&decl), "Shapes.Circle.area");

    decl.name = None;
    assert_eq!(qualified_name(&decl), "Shapes.Circle");

    let mut free = Declaration::new(DeclKind::Function, Context::module("Shapes"));
    free.name = Some(DeclName::plain("scale"));
    assert_eq!(qualified_name(&free), "Shapes.scale");

    let filter = NameFilter::new(Vec::<&str>::new(), ["Shapes.scale"]);
    assert!(!filter.allows_decl(&free));
    assert!(filter.allows_decl(&decl));
}
