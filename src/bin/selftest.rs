//! Scenario self-tests for the foundation library.
//!
//! Run without arguments to execute every scenario, or pass the
//! zero-based index of a single one. The exit code is the number of
//! failed assertions.

use draftcore::collections::LinkedList;
use draftcore::compression::{Deflater, Inflater};
use draftcore::core::{with_default_pool, IntValue, ObjectRef, Status, TextValue};
use draftcore::diff::DiffDistance;
use draftcore::edit::{
    Document, DocumentCore, Editable, EditableObject, Preferences, SharedUndoManager,
};
use draftcore::io::serializer;
use draftcore::system::System;
use draftcore::testkit::{Test, TestContext, TestVector};

const POEM: &str = "Hat der alte Hexenmeister\n\
Sich doch einmal wegbegeben!\n\
Und nun sollen seine Geister\n\
Auch nach meinem Willen leben.\n\
Seine Wort und Werke\n\
Merkt ich und den Brauch,\n\
Und mit Geistesstaerke\n\
Tu ich Wunder auch.\n\
Walle! walle\n\
Manche Strecke,\n\
Dass, zum Zwecke,\n\
Wasser fliesse\n\
Und mit reichem, vollem Schwalle\n\
Zu dem Bade sich ergiesse.\n\
Und nun komm, du alter Besen,\n\
Nimm die schlechten Lumpenhuellen!\n\
Bist schon lange Knecht gewesen:\n\
Nun erfuelle meinen Willen!\n\
Auf zwei Beinen stehe,\n\
Oben sei ein Kopf,\n\
Eile nun und gehe\n\
Mit dem Wassertopf!\n\
Walle! walle\n\
Manche Strecke,\n\
Dass, zum Zwecke,\n\
Wasser fliesse\n\
Und mit reichem, vollem Schwalle\n\
Zu dem Bade sich ergiesse.";

/// Builds a content stream in the style of a generated PDF page.
fn pdf_content_stream() -> Vec<u8> {
    let mut content = String::new();
    for line in 0..120 {
        let y = 785.0 - 14.2 * f64::from(line);
        content.push_str(&format!(
            "BT /Helvetica 10 Tf 56.6929 {y:.4} Td (Zeile {line} des Teststroms) Tj ET\r\n"
        ));
    }
    content.into_bytes()
}

fn round_trip(context: &mut TestContext, label: &str, data: &[u8]) -> usize {
    let mut deflater = Deflater::new();
    deflater.set_input(data);
    let compressed = match deflater.deflate() {
        Ok(compressed) => compressed,
        Err(error) => {
            context.fail(&format!("{label}: deflate failed: {error}"));
            return 0;
        }
    };

    let mut inflater = Inflater::new();
    inflater.set_input(&compressed);
    match inflater.inflate() {
        Ok(restored) => {
            context.check_eq(restored.len(), data.len(), &format!("{label}: length differs"));
            context.check_true(restored == data, &format!("{label}: content differs"));
        }
        Err(error) => context.fail(&format!("{label}: inflate failed: {error}")),
    }
    compressed.len()
}

struct DeflateScenario;

impl Test for DeflateScenario {
    fn name(&self) -> &str {
        "deflate round trips"
    }

    fn run(&self, context: &mut TestContext) {
        round_trip(context, "poem", POEM.as_bytes());
        round_trip(context, "pdf stream", &pdf_content_stream());

        let zeros = vec![0u8; 1_000_000];
        let compressed_len = round_trip(context, "zero buffer", &zeros);
        context.check_true(
            compressed_len < 1_500,
            "zero buffer should compress below 1500 bytes",
        );
        context.check_true(
            compressed_len * 100 < zeros.len(),
            "zero buffer should compress at least 100:1",
        );
    }
}

struct LinkedListUndoScenario;

impl Test for LinkedListUndoScenario {
    fn name(&self) -> &str {
        "linked list with undo"
    }

    fn run(&self, context: &mut TestContext) {
        let um = draftcore::edit::UndoManager::shared();
        let list = LinkedList::new();
        let items: Vec<ObjectRef> = (1..=5).map(IntValue::shared).collect();
        for item in &items {
            list.add(item.clone(), Some(&um));
        }
        um.borrow_mut().close();
        context.check_eq(list.size(), 5, "size after adding five elements");

        list.clear(Some(&um));
        um.borrow_mut().close();
        context.check_eq(list.size(), 0, "size after clear");

        context.check_true(um.borrow_mut().undo(), "undo of clear");
        context.check_eq(list.size(), 5, "size after undo of clear");
        let restored = list.values();
        for (index, (restored, original)) in restored.iter().zip(&items).enumerate() {
            context.check_true(
                ObjectRef::ptr_eq(restored, original),
                &format!("element {index} out of order after undo"),
            );
        }
    }
}

struct AddressBook {
    core: DocumentCore,
    entries: LinkedList,
}

impl AddressBook {
    fn new() -> Self {
        AddressBook {
            core: DocumentCore::new(),
            entries: LinkedList::new(),
        }
    }

    fn add_address(&self, address: ObjectRef) {
        self.entries.add(address, Some(&self.core.undo_manager()));
    }

    fn address_count(&self) -> usize {
        self.entries.size()
    }
}

impl Document for AddressBook {
    fn undo_manager(&self) -> SharedUndoManager {
        self.core.undo_manager()
    }

    fn init_new_document(&mut self, preferences: Option<Preferences>) -> Status {
        self.core.set_preferences(preferences);
        Status::Ok
    }

    fn load_document(&mut self) -> Status {
        Status::Ok
    }

    fn save_document(&mut self) -> Status {
        Status::Ok
    }
}

struct Address {
    um: SharedUndoManager,
    name: Editable<String>,
    street: Editable<String>,
    house_number: Editable<i64>,
}

impl Address {
    fn new(book: &AddressBook) -> Self {
        Address {
            um: book.undo_manager(),
            name: Editable::default(),
            street: Editable::default(),
            house_number: Editable::new(0),
        }
    }

    fn set_name(&self, name: &str) -> Status {
        self.set_member(&self.name, name.to_string())
    }

    fn set_street_address(&self, street: &str, house_number: i64) -> Status {
        self.open_transaction();
        let _ = self.set_member(&self.street, street.to_string());
        let _ = self.set_member_checked(&self.house_number, house_number, |n| *n >= 0);
        self.close_transaction()
    }
}

impl EditableObject for Address {
    fn undo_manager(&self) -> SharedUndoManager {
        self.um.clone()
    }
}

struct EditableSetterScenario;

impl Test for EditableSetterScenario {
    fn name(&self) -> &str {
        "document and editable object"
    }

    fn run(&self, context: &mut TestContext) {
        let mut book = AddressBook::new();
        let _ = book.init_new_document(None);
        let um = book.undo_manager();

        let address = Address::new(&book);
        let _ = address.set_name("UweRuntemund");
        um.borrow_mut().close();
        context.check_eq(address.name.get(), "UweRuntemund".into(), "name wrong (1)");
        um.borrow_mut().undo();
        let _ = address.set_name("Uwe Runtemund");
        um.borrow_mut().close();
        context.check_eq(address.name.get(), "Uwe Runtemund".into(), "name wrong (2)");

        context.check_eq(book.address_count(), 0, "book size wrong (3)");
        book.add_address(TextValue::shared("entry"));
        um.borrow_mut().close();
        context.check_eq(book.address_count(), 1, "book size wrong (4)");
        um.borrow_mut().undo();
        context.check_eq(book.address_count(), 0, "book size wrong (5)");
        um.borrow_mut().redo();
        context.check_eq(book.address_count(), 1, "book size wrong (6)");

        let status = address.set_street_address("Waldstrasse", 51);
        context.check_eq(status, Status::Ok, "transaction status wrong (7)");
        um.borrow_mut().close();
        context.check_eq(address.street.get(), "Waldstrasse".into(), "street wrong (8)");
        context.check_eq(address.house_number.get(), 51, "house number wrong (9)");
        um.borrow_mut().undo();
        context.check_eq(address.street.get(), String::new(), "street wrong (10)");
        context.check_eq(address.house_number.get(), 0, "house number wrong (11)");
        um.borrow_mut().redo();
        context.check_eq(address.street.get(), "Waldstrasse".into(), "street wrong (12)");
        context.check_eq(address.house_number.get(), 51, "house number wrong (13)");

        // A failing transaction must leave no trace.
        let status = address.set_street_address("Teststrasse", -19);
        context.check_eq(status, Status::InvalidInput, "status wrong (14)");
        context.check_eq(address.street.get(), "Waldstrasse".into(), "street wrong (15)");
        context.check_eq(address.house_number.get(), 51, "house number wrong (16)");
        context.check_false(
            um.borrow().has_open_transaction(),
            "transaction is open (17)",
        );
        context.check_false(um.borrow().has_open_undo_step(), "undo step is open (18)");

        // Undo still unwinds the previous, successful edit.
        um.borrow_mut().undo();
        context.check_eq(address.street.get(), String::new(), "street wrong (19)");
        context.check_eq(address.house_number.get(), 0, "house number wrong (20)");
        um.borrow_mut().redo();
        context.check_eq(address.street.get(), "Waldstrasse".into(), "street wrong (21)");
        context.check_eq(address.house_number.get(), 51, "house number wrong (22)");

        // A transaction where only one member changes is still Ok.
        let status = address.set_street_address("Waldstrasse", 7);
        context.check_eq(status, Status::Ok, "status wrong (23)");
        context.check_eq(address.house_number.get(), 7, "house number wrong (24)");
        context.check_false(
            um.borrow().has_open_transaction(),
            "transaction is open (25)",
        );
        context.check_true(um.borrow().has_open_undo_step(), "undo step is closed (26)");
        um.borrow_mut().close();
        context.check_false(um.borrow().has_open_undo_step(), "undo step is open (27)");
    }
}

struct DiffScenario;

impl Test for DiffScenario {
    fn name(&self) -> &str {
        "diff add and delete"
    }

    fn run(&self, context: &mut TestContext) {
        let mut diff = DiffDistance::new();
        for name in ["A", "B", "C"] {
            diff.add_u(TextValue::shared(name));
        }
        for name in ["A", "C"] {
            diff.add_v(TextValue::shared(name));
        }
        let trace = diff.solve();
        context.check_eq(diff.distance(), Some(1), "distance wrong");
        context.check_eq(trace.edit_count(), 1, "edit count wrong");
        let counts = trace.print();
        context.check_eq(counts.deleted, 1, "deleted count wrong");
        context.check_eq(counts.added, 0, "added count wrong");
    }
}

struct BinaryFramingScenario;

impl Test for BinaryFramingScenario {
    fn name(&self) -> &str {
        "binary framing"
    }

    fn run(&self, context: &mut TestContext) {
        let mut buffer = [0u8; 3];
        let written = serializer::serialize_be_u24(&mut buffer, 0, 0x0012_3456);
        context.check_eq(written, 3, "written byte count wrong");
        context.check_true(buffer == [0x12, 0x34, 0x56], "big-endian bytes wrong");
        context.check_eq(
            serializer::deserialize_be_u24(&buffer, 0),
            0x0012_3456,
            "decoded value wrong",
        );
    }
}

struct ObjectLifetimeScenario;

impl Test for ObjectLifetimeScenario {
    fn name(&self) -> &str {
        "object lifetime"
    }

    fn run(&self, context: &mut TestContext) {
        let object = IntValue::shared(42);
        let a = object.retain();
        let b = object.retain();
        let c = object.retain();
        context.check_eq(object.reference_count(), 4, "count after three retains");
        drop(a);
        drop(b);
        drop(c);
        context.check_eq(object.reference_count(), 1, "count after three releases");

        object.autorelease();
        with_default_pool(|pool| {
            context.check_eq(pool.len(), 1, "pool should hold the reference")
        });
        draftcore::core::drain_default_pool();
        with_default_pool(|pool| {
            context.check_true(pool.is_empty(), "pool should be empty after drain")
        });
    }
}

fn main() {
    System::init();
    log::info!("{} {} self-test suite", draftcore::NAME, draftcore::VERSION);

    let mut vector = TestVector::from_args(std::env::args());
    vector.add_test(Box::new(DeflateScenario));
    vector.add_test(Box::new(LinkedListUndoScenario));
    vector.add_test(Box::new(EditableSetterScenario));
    vector.add_test(Box::new(DiffScenario));
    vector.add_test(Box::new(BinaryFramingScenario));
    vector.add_test(Box::new(ObjectLifetimeScenario));

    let failures = vector.execute();
    System::quit();
    std::process::exit(failures.min(i32::MAX as usize) as i32);
}
