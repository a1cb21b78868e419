use super::*;
use crate::dom::MemoryDocument;

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn flash_page() -> (MemoryDocument, NodeId) {
    let mut doc = MemoryDocument::new();
    let body = doc.body_node();
    let flash = doc.element(body, "div").id(FLASH_CONTAINER_ID).build();
    (doc, flash)
}

#[test]
fn notice_fades_then_removes_itself_without_interaction() {
    let (mut doc, flash) = flash_page();
    let mut board = NoticeBoard::new(ms(3000), ms(500));
    board.adopt(flash, ms(0));

    assert_eq!(board.tick(&mut doc, ms(2999)), 0);
    assert_eq!(doc.style(flash, "opacity"), None);

    assert_eq!(board.tick(&mut doc, ms(3000)), 0);
    assert_eq!(doc.style(flash, "opacity").as_deref(), Some("0"));
    assert!(doc.is_connected(flash));

    assert_eq!(board.tick(&mut doc, ms(3500)), 1);
    assert!(!doc.is_connected(flash));
    assert_eq!(board.live(), 0);
}

#[test]
fn first_click_removes_notice_immediately() {
    let (mut doc, flash) = flash_page();
    let mut board = NoticeBoard::new(ms(3000), ms(500));
    board.adopt(flash, ms(0));

    assert_eq!(board.dismiss_all(&mut doc), 1);
    assert!(!doc.is_connected(flash));
    assert_eq!(board.dismiss_all(&mut doc), 0);
    assert_eq!(board.tick(&mut doc, ms(5000)), 0);
}

#[test]
fn externally_removed_notice_cancels_its_timer() {
    let (mut doc, flash) = flash_page();
    let mut board = NoticeBoard::new(ms(3000), ms(500));
    board.adopt(flash, ms(0));

    doc.remove(flash);
    assert_eq!(board.tick(&mut doc, ms(10)), 0);
    assert_eq!(board.live(), 0);
}

#[test]
fn show_renders_a_status_element() {
    let mut doc = MemoryDocument::new();
    let mut board = NoticeBoard::new(ms(3000), ms(500));

    let node = board
        .show(&mut doc, NoticeLevel::Warning, "not saved", ms(100))
        .expect("notice");
    assert!(doc.has_class(node, "flash-warning"));
    assert_eq!(doc.attribute(node, "role").as_deref(), Some("status"));
    assert_eq!(doc.text(node).as_deref(), Some("not saved"));

    assert_eq!(board.tick(&mut doc, ms(3599)), 0);
    assert_eq!(board.tick(&mut doc, ms(3600)), 1);
}
