//! End-to-end tests over whole feeds.

use twt_feed::{parse_feed, Elem, LinkKind, TwtFormat, Twter};

/// The reference post line exercised by every implementation of the
/// format: a mention, a reply subject, and trailing text.
const REFERENCE_LINE: &str = "2020-11-13T16:13:22+01:00\t@<prologic https://twtxt.net/user/prologic/twtxt.txt> (#<pdrsg2q https://twtxt.net/search?tag=pdrsg2q>) Thanks!\n";

fn twter() -> Twter {
    Twter::new("example", "https://example.com/twtxt.txt")
}

#[test]
fn reference_line_end_to_end() {
    let feed = parse_feed(REFERENCE_LINE.as_bytes(), &twter());
    assert!(!feed.is_erroneous());
    assert_eq!(feed.twts().len(), 1);
    let twt = &feed.twts()[0];

    let mentions = twt.mentions();
    assert_eq!(mentions.len(), 1);
    assert_eq!(mentions[0].name(), "prologic");
    assert_eq!(
        mentions[0].target(),
        "https://twtxt.net/user/prologic/twtxt.txt"
    );

    let subject = twt.subject().expect("subject");
    let tag = subject.tag().expect("reply tag");
    assert_eq!(tag.text(), "pdrsg2q");
    assert_eq!(tag.target(), "https://twtxt.net/search?tag=pdrsg2q");

    // Everything after the subject is plain text.
    let trailing: String = twt
        .elems()
        .iter()
        .skip_while(|e| !matches!(e, Elem::Subject(_)))
        .skip(1)
        .map(|e| e.literal())
        .collect();
    assert_eq!(trailing, " Thanks!");

    // And the whole line survives byte-for-byte.
    assert_eq!(twt.literal(), REFERENCE_LINE);
}

#[test]
fn full_feed_round_trip() {
    let src = "# My Twtxt!\n\
               # nick = example\n\
               # url = https://example.com/twtxt.txt\n\
               # follow = xuu https://txt.sour.is/users/xuu.txt\n\
               # follow = prologic https://twtxt.net/user/prologic/twtxt.txt\n\
               \n\
               2016-02-03T23:05:00Z\t@<example http://example.org/twtxt.txt>\u{2028}welcome to twtxt!\n\
               2020-11-13T16:13:22+01:00\t@<prologic https://twtxt.net/user/prologic/twtxt.txt> (#<pdrsg2q https://twtxt.net/search?tag=pdrsg2q>) Thanks!\n";
    let feed = parse_feed(src.as_bytes(), &twter());

    assert_eq!(feed.comments().len(), 5);
    assert_eq!(feed.twts().len(), 2);
    assert!(!feed.is_erroneous());

    // Identity comes from the feed's own metadata.
    assert_eq!(feed.twter().nick, "example");
    assert_eq!(feed.twter().url, "https://example.com/twtxt.txt");

    // `follow` accumulates; the other keys are first-wins.
    let follows = feed.meta().follows();
    assert_eq!(follows.len(), 2);
    assert_eq!(follows[0].nick, "xuu");
    assert_eq!(follows[1].url, "https://twtxt.net/user/prologic/twtxt.txt");

    // Every post line reproduces its source bytes, soft break included.
    let all_posts: String = feed.twts().iter().map(|t| t.literal()).collect();
    assert!(src.ends_with(&all_posts));
    assert!(feed.twts()[0]
        .elems()
        .iter()
        .any(|e| matches!(e, Elem::LineSep)));
}

#[test]
fn malformed_lines_never_discard_a_feed() {
    let src = "not a post\n\
               2020-99-99T99:99:99Z\tbroken date\n\
               2021-01-01T10:45:00Z\tstill here\n";
    let feed = parse_feed(src.as_bytes(), &twter());
    assert!(!feed.is_erroneous());
    assert_eq!(feed.twts().len(), 1);
    assert_eq!(feed.twts()[0].body(), "still here");
    assert_eq!(feed.errors().len(), 2); // the garbage line and the impossible date
}

#[test]
fn feed_of_nothing_but_garbage_is_flagged() {
    let feed = parse_feed("one\ntwo\nthree\n".as_bytes(), &twter());
    assert!(feed.is_erroneous());
    assert!(feed.error().is_some());
    assert!(feed.twts().is_empty());
}

#[test]
fn naked_and_bracketed_links_coexist() {
    let src = "2021-01-21T23:25:59Z\tAlligator\u{2028}\u{2028}![](https://twtxt.net/media/L6g5PMqA2JXX)\u{2028}photo at https://example.com/photos #AustraliaZoo\n";
    let feed = parse_feed(src.as_bytes(), &twter());
    let twt = &feed.twts()[0];
    let links = twt.links();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].kind(), LinkKind::Media);
    assert_eq!(links[0].target(), "https://twtxt.net/media/L6g5PMqA2JXX");
    assert_eq!(links[1].kind(), LinkKind::Naked);
    assert_eq!(links[1].target(), "https://example.com/photos");
    let tags = twt.tags();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].text(), "AustraliaZoo");
    assert_eq!(twt.literal(), src);

    // Markdown keeps the link spellings; plain keeps them readable.
    let md = twt.format_text(TwtFormat::Markdown, None);
    assert!(md.contains("![](https://twtxt.net/media/L6g5PMqA2JXX)"));
    let plain = twt.format_text(TwtFormat::Plain, None);
    assert!(plain.contains("photo at https://example.com/photos"));
    assert!(plain.contains("#AustraliaZoo"));
}
