use blocks::host::ShadowTemplate;
use blocks::input::{Check, Input};
use blocks::{
    BlockError, CALLER, ContentId, ContentKind, Host, INTERNAL_CALLER, MUTATOR_ROOT,
    ProcedureBlock, Workspace,
};
use proccode::codec::CodecError;
use proccode::mutation::{Mutation, MutationKind};

fn json(items: &[&str]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("\"{}\"", s)).collect();
    format!("[{}]", quoted.join(","))
}

fn caller_xml(code: &str, ids: &[&str]) -> String {
    format!(
        r#"<mutation proccode="{}" argumentids='{}' warp="false"/>"#,
        code,
        json(ids)
    )
}

fn definition_xml(code: &str, ids: &[&str], names: &[&str], defaults: &[&str]) -> String {
    format!(
        r#"<mutation proccode="{}" argumentids='{}' argumentnames='{}' argumentdefaults='{}' warp="false"/>"#,
        code,
        json(ids),
        json(names),
        json(defaults)
    )
}

fn load(block: &mut ProcedureBlock, ws: &mut Workspace, xml: &str) -> Vec<ContentId> {
    block.load_mutation_xml(ws, xml).expect("load failed")
}

fn caller(ws: &mut Workspace, code: &str, ids: &[&str]) -> ProcedureBlock {
    let mut block = ProcedureBlock::with_id(CALLER, "call");
    load(&mut block, ws, &caller_xml(code, ids));
    block
}

fn target(block: &ProcedureBlock, id: &str) -> Option<ContentId> {
    block.slot(id).expect("no such slot").target()
}

fn layout(block: &ProcedureBlock, ws: &Workspace) -> String {
    block.layout(ws).to_string()
}

/// (name, check, target) of every value slot, in order.
fn slots(block: &ProcedureBlock) -> Vec<(String, Option<Check>, Option<ContentId>)> {
    block
        .inputs()
        .iter()
        .filter_map(Input::as_value)
        .map(|s| (s.name.clone(), s.check, s.target()))
        .collect()
}

#[test]
fn caller_move_steps() {
    let mut ws = Workspace::with_seed(1);
    let block = caller(&mut ws, "move %n steps", &["a"]);

    assert_eq!(block.inputs().len(), 3);
    assert!(matches!(&block.inputs()[0], Input::Label { text, editable: false, .. } if text == "move"));
    assert!(matches!(&block.inputs()[2], Input::Label { text, .. } if text == "steps"));

    let shadow = target(&block, "a").expect("slot is empty");
    let content = ws.get(shadow).unwrap();
    assert_eq!(content.kind, ContentKind::MathNumber);
    assert_eq!(content.field, "99");
    assert!(content.shadow);
    assert!(content.initialized);
    assert_eq!(ws.parent_of(shadow), Some(("call", "a")));
    assert_eq!(layout(&block, &ws), "move (99) steps");
}

#[test]
fn caller_string_and_boolean_defaults() {
    let mut ws = Workspace::with_seed(1);
    let block = caller(&mut ws, "say %s if %b", &["s", "b"]);

    assert_eq!(layout(&block, &ws), "say (hello world) if <>");
    assert_eq!(block.slot("b").unwrap().check, Some(Check::Boolean));
    assert_eq!(block.slot("s").unwrap().check, None);
    assert_eq!(ws.live_count(), 1);
}

#[test]
fn empty_signature_has_no_inputs() {
    let mut ws = Workspace::with_seed(1);
    let block = caller(&mut ws, "", &[]);
    assert!(block.inputs().is_empty());
    assert_eq!(ws.live_count(), 0);
}

#[test]
fn leading_parameter_has_no_leading_label() {
    let mut ws = Workspace::with_seed(1);
    let block = caller(&mut ws, "%n %s", &["x", "y"]);
    assert_eq!(block.inputs().len(), 2);
    assert!(block.inputs().iter().all(|i| matches!(i, Input::Value(_))));
    assert_eq!(layout(&block, &ws), "(99) (hello world)");
}

#[test]
#[tracing_test::traced_test]
fn reconciling_twice_is_idempotent() {
    let mut ws = Workspace::with_seed(1);
    let mut block = caller(&mut ws, "say %s for %n secs %b", &["s", "n", "b"]);
    let user = ws.new_user_block(ContentKind::user_boolean("sensing_mousedown"), "");
    block.plug_argument(&mut ws, "b", user).unwrap();

    let before = slots(&block);
    let live = ws.live_count();
    let orphans = block.update_display(&mut ws).unwrap();

    assert!(orphans.is_empty());
    assert_eq!(slots(&block), before);
    assert_eq!(ws.live_count(), live);
    assert_eq!(block.inputs().len(), 6);
    assert!(logs_contain("reconciled procedures_callnoreturn call"));
    assert!(logs_contain("3 salvaged, 0 orphaned"));
}

#[test]
fn relabelling_keeps_user_content_under_its_id() {
    let mut ws = Workspace::with_seed(1);
    let mut block = caller(&mut ws, "set %s to %n", &["p", "q"]);
    let user = ws.new_user_block(ContentKind::user("operator_join"), "");
    let replaced = block.plug_argument(&mut ws, "p", user).unwrap();
    assert_eq!(replaced, None);
    let q_shadow = target(&block, "q");

    load(&mut block, &mut ws, &caller_xml("put %s into slot %n", &["p", "q"]));

    assert_eq!(target(&block, "p"), Some(user));
    assert_eq!(target(&block, "q"), q_shadow);
    assert_eq!(ws.parent_of(user), Some(("call", "p")));
    assert_eq!(layout(&block, &ws), "put (operator_join) into slot (99)");
}

#[test]
fn reordering_parameters_follows_ids() {
    let mut ws = Workspace::with_seed(1);
    let mut block = caller(&mut ws, "%s %n", &["p", "q"]);
    let p = target(&block, "p");
    let q = target(&block, "q");

    load(&mut block, &mut ws, &caller_xml("%n %s", &["q", "p"]));

    assert_eq!(slots(&block)[0].0, "q");
    assert_eq!(target(&block, "p"), p);
    assert_eq!(target(&block, "q"), q);
}

#[test]
fn caller_type_change_orphans_user_content() {
    let mut ws = Workspace::with_seed(1);
    let mut block = caller(&mut ws, "wait %s", &["p"]);
    let user = ws.new_user_block(ContentKind::user("operator_join"), "");
    block.plug_argument(&mut ws, "p", user).unwrap();

    let orphans = load(&mut block, &mut ws, &caller_xml("wait %b", &["p"]));

    assert_eq!(orphans, vec![user]);
    assert!(ws.contains(user));
    assert_eq!(ws.parent_of(user), None);
    assert_eq!(target(&block, "p"), None);
    assert_eq!(layout(&block, &ws), "wait <>");
}

#[test]
fn caller_type_change_disposes_placeholder() {
    let mut ws = Workspace::with_seed(1);
    let mut block = caller(&mut ws, "wait %s", &["p"]);
    let shadow = target(&block, "p").unwrap();

    let orphans = load(&mut block, &mut ws, &caller_xml("wait %b", &["p"]));

    assert!(orphans.is_empty());
    assert!(!ws.contains(shadow));
    assert_eq!(ws.live_count(), 0);
}

#[test]
fn caller_keeps_number_placeholder_across_value_types() {
    let mut ws = Workspace::with_seed(1);
    let mut block = caller(&mut ws, "go %n", &["p"]);
    let shadow = target(&block, "p").unwrap();

    load(&mut block, &mut ws, &caller_xml("go %s", &["p"]));

    assert_eq!(target(&block, "p"), Some(shadow));
    assert_eq!(
        block.slot("p").unwrap().shadow_template(),
        Some(&ShadowTemplate {
            kind: ContentKind::Text,
            value: "hello world".to_string(),
        })
    );
}

#[test]
fn removed_parameter_placeholder_is_swept() {
    let mut ws = Workspace::with_seed(1);
    let mut block = caller(&mut ws, "a %n b %s", &["p", "q"]);
    let q_shadow = target(&block, "q").unwrap();
    assert_eq!(ws.live_count(), 2);

    let orphans = load(&mut block, &mut ws, &caller_xml("a %n b", &["p"]));

    assert!(orphans.is_empty());
    assert!(!ws.contains(q_shadow));
    assert_eq!(ws.live_count(), 1);
    assert!(block.slot("q").is_none());
}

#[test]
fn detaching_reattached_content_respawns_template() {
    let mut ws = Workspace::with_seed(1);
    let mut block = caller(&mut ws, "turn %n degrees", &["p"]);
    let user = ws.new_user_block(ContentKind::user("operator_add"), "");
    block.plug_argument(&mut ws, "p", user).unwrap();
    block.update_display(&mut ws).unwrap();

    let detached = block.detach_argument(&mut ws, "p");

    assert_eq!(detached, Some(user));
    assert_eq!(ws.parent_of(user), None);
    let respawned = target(&block, "p").unwrap();
    assert_ne!(respawned, user);
    assert!(ws.is_shadow(respawned));
    assert_eq!(ws.field_text(respawned), Some("10"));
}

#[test]
fn shadows_cannot_be_detached() {
    let mut ws = Workspace::with_seed(1);
    let mut block = caller(&mut ws, "turn %n degrees", &["p"]);
    let shadow = target(&block, "p");
    assert_eq!(block.detach_argument(&mut ws, "p"), None);
    assert_eq!(target(&block, "p"), shadow);
}

#[test]
fn plugging_checks_boolean_slots() {
    let mut ws = Workspace::with_seed(1);
    let mut block = caller(&mut ws, "if %b", &["p"]);
    let text = ws.new_user_block(ContentKind::user("operator_join"), "");

    let err = block.plug_argument(&mut ws, "p", text).unwrap_err();
    assert!(matches!(err, BlockError::Incompatible { .. }));
    assert!(matches!(
        block.plug_argument(&mut ws, "missing", text),
        Err(BlockError::NoSuchSlot(_))
    ));
}

#[test]
fn plugging_moves_content_between_slots() {
    let mut ws = Workspace::with_seed(1);
    let mut block = caller(&mut ws, "a %s b %s", &["p", "q"]);
    let user = ws.new_user_block(ContentKind::user("operator_join"), "");

    block.plug_argument(&mut ws, "p", user).unwrap();
    assert_eq!(block.plug_argument(&mut ws, "q", user).unwrap(), None);

    assert_eq!(target(&block, "q"), Some(user));
    let p = target(&block, "p").expect("p respawns a placeholder");
    assert_ne!(p, user);
    assert!(ws.is_shadow(p));
    assert_eq!(ws.get(p).unwrap().field, "hello world");
    assert_eq!(ws.parent_of(user), Some(("call", "q")));

    block.update_display(&mut ws).unwrap();
    assert_eq!(target(&block, "q"), Some(user));
    assert_eq!(target(&block, "p"), Some(p));
}

#[test]
fn plugging_into_the_same_slot_twice_is_a_no_op() {
    let mut ws = Workspace::with_seed(1);
    let mut block = caller(&mut ws, "say %s", &["p"]);
    let user = ws.new_user_block(ContentKind::user("operator_join"), "");

    block.plug_argument(&mut ws, "p", user).unwrap();
    let live = ws.live_count();
    assert_eq!(block.plug_argument(&mut ws, "p", user).unwrap(), None);
    assert_eq!(target(&block, "p"), Some(user));
    assert_eq!(ws.live_count(), live);
}

#[test]
fn argument_reporters_reject_drops() {
    let mut ws = Workspace::with_seed(1);
    let mut block = ProcedureBlock::with_id(INTERNAL_CALLER, "proto");
    load(&mut block, &mut ws, &definition_xml("go %s", &["p"], &["x"], &[""]));
    let reporter = target(&block, "p").unwrap();
    let user = ws.new_user_block(ContentKind::user("operator_join"), "");

    let err = block.plug_argument(&mut ws, "p", user).unwrap_err();
    assert!(matches!(err, BlockError::SlotLocked { .. }));
    assert!(ws.contains(reporter));
    assert_eq!(target(&block, "p"), Some(reporter));
    assert_eq!(ws.parent_of(user), None);
}

#[test]
fn name_editors_reject_drops() {
    let mut ws = Workspace::with_seed(1);
    let mut block = ProcedureBlock::with_id(MUTATOR_ROOT, "root");
    load(
        &mut block,
        &mut ws,
        &definition_xml("if %b", &["p"], &["cond"], &["false"]),
    );
    let editor = target(&block, "p").unwrap();
    let user = ws.new_user_block(ContentKind::user_boolean("sensing_mousedown"), "");

    let err = block.plug_argument(&mut ws, "p", user).unwrap_err();
    assert!(matches!(err, BlockError::SlotLocked { .. }));
    assert!(ws.contains(editor));
    assert_eq!(target(&block, "p"), Some(editor));
}

#[test]
fn internal_caller_creates_argument_reporters() {
    let mut ws = Workspace::with_seed(1);
    let mut block = ProcedureBlock::with_id(INTERNAL_CALLER, "proto");
    load(
        &mut block,
        &mut ws,
        &definition_xml("greet %s loudly %b", &["p", "q"], &["who", "shout"], &["", "false"]),
    );

    let p = target(&block, "p").unwrap();
    let q = target(&block, "q").unwrap();
    assert_eq!(ws.kind(p), Some(&ContentKind::ArgumentReporterStringNumber));
    assert_eq!(ws.kind(q), Some(&ContentKind::ArgumentReporterBoolean));
    assert!(ws.is_shadow(p) && ws.is_shadow(q));
    assert_eq!(layout(&block, &ws), "greet (who) loudly <shout>");
}

#[test]
fn internal_caller_refreshes_reporter_names() {
    let mut ws = Workspace::with_seed(1);
    let mut block = ProcedureBlock::with_id(INTERNAL_CALLER, "proto");
    load(&mut block, &mut ws, &definition_xml("greet %s", &["p"], &["who"], &[""]));
    let reporter = target(&block, "p").unwrap();

    load(&mut block, &mut ws, &definition_xml("greet %n", &["p"], &["whom"], &[""]));

    assert_eq!(target(&block, "p"), Some(reporter));
    assert_eq!(ws.field_text(reporter), Some("whom"));
}

#[test]
fn internal_caller_type_change_replaces_reporter() {
    let mut ws = Workspace::with_seed(1);
    let mut block = ProcedureBlock::with_id(INTERNAL_CALLER, "proto");
    load(&mut block, &mut ws, &definition_xml("greet %s", &["p"], &["who"], &[""]));
    let old = target(&block, "p").unwrap();

    let orphans = load(&mut block, &mut ws, &definition_xml("greet %b", &["p"], &["who"], &[""]));

    let new = target(&block, "p").unwrap();
    assert!(orphans.is_empty());
    assert!(!ws.contains(old));
    assert_eq!(ws.kind(new), Some(&ContentKind::ArgumentReporterBoolean));
    assert_eq!(ws.field_text(new), Some("who"));
}

#[test]
fn mutator_root_type_change_replaces_editor() {
    let mut ws = Workspace::with_seed(1);
    let mut root = ProcedureBlock::with_id(MUTATOR_ROOT, "root");
    load(&mut root, &mut ws, &definition_xml("do %s", &["p"], &["thing"], &[""]));
    let old = target(&root, "p").unwrap();
    assert_eq!(ws.kind(old), Some(&ContentKind::Text));

    load(&mut root, &mut ws, &definition_xml("do %b", &["p"], &["flag"], &["false"]));

    let new = target(&root, "p").unwrap();
    assert!(!ws.contains(old));
    assert_eq!(ws.kind(new), Some(&ContentKind::BooleanTextInput));
    assert_eq!(ws.field_text(new), Some("flag"));
}

#[test]
fn malformed_mutation_leaves_block_unchanged() {
    let mut ws = Workspace::with_seed(1);
    let mut block = caller(&mut ws, "move %n steps", &["a"]);
    let before = slots(&block);

    let err = block
        .load_mutation_xml(
            &mut ws,
            r#"<mutation proccode="jump %n" argumentids="[oops" warp="false"/>"#,
        )
        .unwrap_err();

    assert!(matches!(
        err,
        BlockError::Codec(CodecError::MalformedMutation { field: "argumentids", .. })
    ));
    assert_eq!(block.proc_code(), "move %n steps");
    assert_eq!(slots(&block), before);
}

#[test]
fn invalid_parameter_type_leaves_block_unchanged() {
    let mut ws = Workspace::with_seed(1);
    let mut block = caller(&mut ws, "move %n steps", &["a"]);

    let err = block
        .load_mutation_xml(&mut ws, &caller_xml("jump %q", &["a"]))
        .unwrap_err();

    assert!(matches!(
        err,
        BlockError::Codec(CodecError::InvalidParameterType { tag: Some('q'), .. })
    ));
    assert_eq!(block.proc_code(), "move %n steps");
    assert_eq!(layout(&block, &ws), "move (99) steps");
}

#[test]
fn id_count_mismatch_is_malformed() {
    let mut ws = Workspace::with_seed(1);
    let mut block = caller(&mut ws, "move %n steps", &["a"]);
    let err = block
        .load_mutation_xml(&mut ws, &caller_xml("%n %n", &["a"]))
        .unwrap_err();
    assert!(err.to_string().contains("malformed mutation"));
    assert_eq!(block.state().arguments.len(), 1);
}

#[test]
fn definition_mutation_round_trips_through_block() {
    let mut ws = Workspace::with_seed(1);
    let mut block = ProcedureBlock::with_id(INTERNAL_CALLER, "proto");
    let xml = definition_xml("jump %n times %b", &["p", "q"], &["count", "high"], &["1", "false"]);
    load(&mut block, &mut ws, &xml);

    let expected = Mutation::parse_xml(&xml, MutationKind::Definition).unwrap();
    assert_eq!(block.to_mutation(), expected);

    let mut copy = ProcedureBlock::with_id(INTERNAL_CALLER, "copy");
    load(&mut copy, &mut ws, &block.mutation_xml().unwrap());
    assert_eq!(copy.state(), block.state());
}

#[test]
fn caller_mutation_omits_definition_fields() {
    let mut ws = Workspace::with_seed(1);
    let block = caller(&mut ws, "move %n steps", &["a"]);
    let mutation = block.to_mutation();
    assert_eq!(mutation.kind(), MutationKind::Caller);
    assert!(!block.mutation_xml().unwrap().contains("argumentnames"));
}

#[test]
fn append_boolean_on_empty_root() {
    let mut ws = Workspace::with_seed(7);
    let mut root = ProcedureBlock::new(MUTATOR_ROOT, &mut ws);

    root.append_boolean(&mut ws).unwrap();

    assert_eq!(root.proc_code(), " %b");
    let arguments = &root.state().arguments;
    assert_eq!(arguments.len(), 1);
    assert_eq!(arguments[0].id.chars().count(), 20);
    assert_ne!(arguments[0].id, root.id());
    assert_eq!(arguments[0].name, "boolean");
    assert_eq!(root.inputs().len(), 1);

    let editor = target(&root, &arguments[0].id).unwrap();
    assert_eq!(ws.kind(editor), Some(&ContentKind::BooleanTextInput));
    assert!(ws.is_shadow(editor));
    assert_eq!(layout(&root, &ws), "<boolean>");
}

#[test]
fn root_append_commands_build_signature() {
    let mut ws = Workspace::with_seed(7);
    let mut root = ProcedureBlock::with_id(MUTATOR_ROOT, "root");

    root.append_label(&mut ws).unwrap();
    root.append_string_number(&mut ws).unwrap();
    root.append_boolean(&mut ws).unwrap();

    assert_eq!(root.proc_code(), " label text %s %b");
    assert_eq!(layout(&root, &ws), "label text (string or number) <boolean>");
    assert!(matches!(
        &root.inputs()[0],
        Input::Label { name: Some(_), editable: true, .. }
    ));
    let defaults: Vec<&str> = root.state().arguments.iter().map(|a| a.default.as_str()).collect();
    assert_eq!(defaults, vec!["", "false"]);
}

#[test]
fn root_derives_signature_from_user_edits() {
    let mut ws = Workspace::with_seed(7);
    let mut root = ProcedureBlock::with_id(MUTATOR_ROOT, "root");
    root.append_label(&mut ws).unwrap();
    root.append_string_number(&mut ws).unwrap();
    root.append_boolean(&mut ws).unwrap();
    let ids: Vec<String> = root.state().arguments.iter().map(|a| a.id.clone()).collect();
    let name_editor = target(&root, &ids[0]).unwrap();

    root.set_label_text(0, "jump 100%").unwrap();
    ws.set_field_text(name_editor, "height");
    root.derive_signature_from_slots(&ws).unwrap();

    assert_eq!(root.proc_code(), "jump 100\\% %s %b");
    let names: Vec<&str> = root.state().arguments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["height", "boolean"]);
    let derived: Vec<String> = root.state().arguments.iter().map(|a| a.id.clone()).collect();
    assert_eq!(derived, ids);
    assert_eq!(root.state().arguments[1].default, "false");

    root.update_display(&mut ws).unwrap();
    assert_eq!(target(&root, &ids[0]), Some(name_editor));
    assert_eq!(layout(&root, &ws), "jump 100% (height) <boolean>");
}

#[test]
fn reverse_sync_rejects_statement_inputs() {
    let mut ws = Workspace::with_seed(7);
    let mut root = ProcedureBlock::with_id(MUTATOR_ROOT, "root");
    root.append_string_number(&mut ws).unwrap();
    root.append_input(Input::Statement {
        name: "SUBSTACK".to_string(),
    });
    let before = root.state().clone();

    let err = root.derive_signature_from_slots(&ws).unwrap_err();

    assert!(matches!(
        err,
        BlockError::UnexpectedInputKind { index: 1, ref found } if found == "statement"
    ));
    assert_eq!(root.state(), &before);
}

#[test]
fn editing_commands_require_mutator_root() {
    let mut ws = Workspace::with_seed(1);
    let mut block = caller(&mut ws, "", &[]);
    assert!(matches!(
        block.append_boolean(&mut ws),
        Err(BlockError::NotEditable("procedures_callnoreturn"))
    ));
    assert!(matches!(
        block.derive_signature_from_slots(&ws),
        Err(BlockError::NotEditable(_))
    ));
    assert!(matches!(
        block.set_label_text(0, "x"),
        Err(BlockError::NoSuchInput(0))
    ));
}

#[test]
fn rendered_block_is_rendered_once_per_update() {
    let mut ws = Workspace::with_seed(1);
    let mut block = caller(&mut ws, "move %n steps", &["a"]);
    assert_eq!(ws.render_count("call"), 0);

    block.set_rendered(true);
    block.update_display(&mut ws).unwrap();
    load(&mut block, &mut ws, &caller_xml("move %n", &["a"]));

    assert!(block.is_rendered());
    assert_eq!(ws.render_count("call"), 2);
}

#[test]
fn insertion_marker_skips_render_work() {
    let mut ws = Workspace::with_seed(1);
    let mut block = ProcedureBlock::with_id(CALLER, "marker");
    block.set_rendered(true);
    block.set_insertion_marker(true);

    load(&mut block, &mut ws, &caller_xml("move %n steps", &["a"]));

    assert!(block.is_rendered());
    assert_eq!(ws.render_count("marker"), 0);
    let shadow = target(&block, "a").unwrap();
    assert!(!ws.get(shadow).unwrap().initialized);
}

#[test]
fn dispose_keeps_user_content() {
    let mut ws = Workspace::with_seed(1);
    let mut block = caller(&mut ws, "say %s for %n", &["s", "n"]);
    let user = ws.new_user_block(ContentKind::user("operator_join"), "");
    block.plug_argument(&mut ws, "s", user).unwrap();

    let detached = block.dispose(&mut ws);

    assert_eq!(detached, vec![user]);
    assert_eq!(ws.live_count(), 1);
    assert_eq!(ws.parent_of(user), None);
}

#[test]
fn generated_ids_are_distinct() {
    let mut ws = Workspace::with_seed(3);
    let a = ws.gen_uid();
    let b = ws.gen_uid();
    assert_eq!(a.len(), 20);
    assert_ne!(a, b);
}
