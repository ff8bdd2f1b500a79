// Composite background property tests
//
// The host stores "path,opacity,style,anchor" as one string; reconciling a new
// path must keep the user's other choices and always emit four fields.

use project_identifier::background::{reconcile, reset_to_defaults, Anchor, BackgroundProperties, FillStyle};
use rstest::rstest;

#[test]
fn test_reconcile_from_nothing_uses_defaults() {
    assert_eq!(reconcile(None, "/a/b.png"), "/a/b.png,15,plain,bottom_right");
}

#[rstest]
#[case(Some("/old.png,40,tile,top_left"), "/new.png,40,tile,top_left")]
#[case(Some("/old.png"), "/new.png,15,plain,bottom_right")]
#[case(Some(""), "/new.png,15,plain,bottom_right")]
#[case(Some("/old.png,250,scale,center"), "/new.png,100,scale,center")]
#[case(Some("/old.png,-7,center,top_center"), "/new.png,0,center,top_center")]
#[case(Some("/old.png,abc,sideways,nowhere"), "/new.png,15,plain,bottom_right")]
#[case(Some(" /old.png , 30 , scale , middle_left "), "/new.png,30,scale,middle_left")]
fn test_reconcile_keeps_valid_fields(#[case] existing: Option<&str>, #[case] expected: &str) {
    assert_eq!(reconcile(existing, "/new.png"), expected);
}

#[rstest]
#[case(None)]
#[case(Some("/x.png,55,tile,top_right"))]
#[case(Some("garbage"))]
#[case(Some(",,,"))]
#[case(Some("/x.png,999,bogus,center,extra"))]
#[case(Some("/dir,with,commas/x.png,25,scale,top_center"))]
fn test_reconcile_is_idempotent(#[case] existing: Option<&str>) {
    let once = reconcile(existing, "/p/Proj-P-0123456789.png");
    let twice = reconcile(Some(&once), "/p/Proj-P-0123456789.png");
    assert_eq!(once, twice);
}

#[rstest]
#[case(None, ",15,plain,bottom_right")]
#[case(Some("/x.png,55,tile,top_right"), "/x.png,15,plain,bottom_right")]
#[case(Some("/x.png"), "/x.png,15,plain,bottom_right")]
fn test_reset_to_defaults_keeps_path(#[case] existing: Option<&str>, #[case] expected: &str) {
    let reset = reset_to_defaults(existing);
    assert_eq!(reset, expected);
    assert_eq!(reset_to_defaults(Some(&reset)), reset);
}

#[test]
fn test_output_always_has_four_fields() {
    for existing in [None, Some(""), Some("a,b"), Some("a,1,2,3,4,5")] {
        assert_eq!(reconcile(existing, "/p.png").split(',').count(), 4);

        let reset = reset_to_defaults(existing);
        assert_eq!(reset.rsplitn(4, ',').count(), 4);
        assert_eq!(BackgroundProperties::parse(Some(&reset)).to_composite(), reset);
    }
}

#[test]
fn test_comma_in_new_path_keeps_user_fields() {
    let once = reconcile(Some("/x.png,40,tile,center"), "/home/u/a,b/P.png");
    assert_eq!(once, "/home/u/a,b/P.png,40,tile,center");
    assert_eq!(reconcile(Some(&once), "/home/u/a,b/P.png"), once);
}

#[test]
fn test_parse_exposes_typed_fields() {
    let props = BackgroundProperties::parse(Some("/x.png,60,scale,bottom_left"));
    assert_eq!(props.path, "/x.png");
    assert_eq!(props.opacity_percent, 60);
    assert_eq!(props.fill, FillStyle::Scale);
    assert_eq!(props.anchor, Anchor::BottomLeft);
}
