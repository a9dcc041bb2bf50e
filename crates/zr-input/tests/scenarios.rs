//! Byte-exact end-to-end scenarios for the event queue and batch packer.

use zr_input::batch::{pack_batch, BatchWriter};
use zr_input::decode::{decode_header, records, FLAG_TRUNCATED};
use zr_input::event::{Event, KeyAction, KeyCode, Mods};
use zr_input::queue::EventQueue;

#[test]
fn scenario_8_event_batch_truncates_without_partial_record() {
    // 40-byte buffer; one KEY record needs 24 (header) + 16 (record header)
    // + 16 (payload) = 56 bytes total, which does not fit.
    let mut buf = vec![0xAAu8; 40];
    let mut writer = BatchWriter::begin(&mut buf).unwrap();
    let key = Event::Key { code: KeyCode::Char('a'), mods: Mods::empty(), action: KeyAction::Press };
    let mut scratch = Vec::new();
    let appended = writer.append_event(&key, 0, &mut scratch);
    assert!(!appended);
    let len = writer.finish();
    assert_eq!(len, 24);
    let header = decode_header(&buf[..len]).unwrap();
    assert_eq!(header.event_count, 0);
    assert_eq!(header.flags, FLAG_TRUNCATED);
    assert_eq!(header.total_size, 24);
}

#[test]
fn scenario_10_event_queue_coalesces_resize_last_wins() {
    let mut q = EventQueue::new(8, 1024);
    q.push(Event::Resize { cols: 80, rows: 24 });
    q.push(Event::Resize { cols: 120, rows: 40 });
    assert_eq!(q.len(), 1);
    assert_eq!(q.peek(), Some(&Event::Resize { cols: 120, rows: 40 }));
}

#[test]
fn decode_of_encode_recovers_event_count_and_types_when_not_truncated() {
    let mut buf = vec![0u8; 512];
    let events = vec![
        (Event::Key { code: KeyCode::Enter, mods: Mods::empty(), action: KeyAction::Press }, 0u32),
        (Event::Text('z'), 1u32),
        (Event::Resize { cols: 100, rows: 30 }, 2u32),
        (Event::Tick { dt_ms: 16 }, 3u32),
    ];
    let len = pack_batch(&mut buf, &events).unwrap();
    let header = decode_header(&buf[..len]).unwrap();
    assert_eq!(header.flags, 0);
    assert_eq!(header.event_count, events.len() as u32);
    let recs: Vec<_> = records(&buf[..len], &header).collect();
    assert_eq!(recs.len(), events.len());
    // KEY, TEXT, RESIZE, TICK record type codes.
    assert_eq!(recs.iter().map(|r| r.rec_type).collect::<Vec<_>>(), vec![0, 1, 3, 7]);
}
