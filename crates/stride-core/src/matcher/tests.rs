use super::*;
use crate::buffer::Buffer;
use crate::edit::TextEdit;
use crate::tracker::ChangeTracker;

/// Run one edit through the tracker and match the resulting logical edit.
fn matches_for(
    config: MatchConfig,
    language: Language,
    text: &str,
    edit: TextEdit,
) -> (String, Vec<Candidate>) {
    let mut buffer = Buffer::with_language(text, language);
    let mut tracker = ChangeTracker::new();
    tracker.begin(buffer.text());
    let event = buffer.apply(&edit).unwrap();
    tracker.record(&event);
    let batch = tracker.finish().unwrap();
    assert_eq!(batch.edits.len(), 1, "expected one logical edit");

    let matcher = SimilarityMatcher::new(config);
    let candidates = matcher.find(&batch.before, &batch.after, language, &batch.edits[0]);
    (batch.after, candidates)
}

fn span_of_nth(text: &str, needle: &str, nth: usize) -> Span {
    let (start, _) = text.match_indices(needle).nth(nth).unwrap();
    Span::new(start, start + needle.len())
}

#[test]
fn test_rename_propagates_to_identifiers_only() {
    let text = "const app = express();\napp.use(cors());\napp.listen(3000);\n// start the app\nconst msg = \"app\";\n";
    let (after, found) = matches_for(
        MatchConfig::default(),
        Language::TypeScript,
        text,
        TextEdit::replace(span_of_nth(text, "app", 0), "server"),
    );

    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|c| c.role == Role::Identifier));
    assert!(found.iter().all(|c| c.confidence == Confidence::High));
    assert_eq!(found[0].target, span_of_nth(&after, "app", 0));
    assert_eq!(found[1].target, span_of_nth(&after, "app", 1));
    assert!(found[0].distance < found[1].distance);
    assert_eq!(found[0].payload, "server");
}

#[test]
fn test_rename_inside_string_stays_in_strings() {
    let text = "log(\"error\");\nconst error = 1;\nthrow new Error(\"error\");\n";
    let (after, found) = matches_for(
        MatchConfig::default(),
        Language::TypeScript,
        text,
        TextEdit::replace(span_of_nth(text, "error", 0), "failure"),
    );

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].role, Role::StringText);
    assert_eq!(&after[found[0].target.range()], "error");
    assert!(after[..found[0].target.start].contains("Error("));
}

#[test]
fn test_rename_reaches_python_format_strings() {
    let text = "def greet(user_name):\n    print(f\"Hello {user_name}\")\n    return user_name.upper()\n";
    let (after, found) = matches_for(
        MatchConfig::default(),
        Language::Python,
        text,
        TextEdit::replace(span_of_nth(text, "user_name", 0), "username"),
    );

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].target, span_of_nth(&after, "user_name", 0));
    assert_eq!(found[1].target, span_of_nth(&after, "user_name", 1));
}

#[test]
fn test_relaxed_roles_include_properties_with_lower_confidence() {
    let text = "const name = \"x\";\nuser.name = name;\n";
    let edit = TextEdit::replace(span_of_nth(text, "name", 0), "label");

    let (_, strict) = matches_for(MatchConfig::default(), Language::TypeScript, text, edit.clone());
    assert_eq!(strict.len(), 1);
    assert_eq!(strict[0].role, Role::Identifier);

    let relaxed = MatchConfig {
        strict_roles: false,
        ..MatchConfig::default()
    };
    let (_, found) = matches_for(relaxed, Language::TypeScript, text, edit);
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].confidence, Confidence::High);
    assert_eq!(found[1].confidence, Confidence::Medium);
    assert_eq!(found[1].role, Role::Property);
}

#[test]
fn test_plain_text_fallback_is_word_bounded() {
    let text = "foo bar foo foobar";
    let (_, found) = matches_for(
        MatchConfig::default(),
        Language::Unknown,
        text,
        TextEdit::replace(Span::new(0, 3), "baz"),
    );
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].target, Span::new(8, 11));
    assert_eq!(found[0].confidence, Confidence::Low);
    assert_eq!(found[0].role, Role::Word);

    let disabled = MatchConfig {
        plain_text_fallback: false,
        ..MatchConfig::default()
    };
    let (_, found) = matches_for(
        disabled,
        Language::Unknown,
        text,
        TextEdit::replace(Span::new(0, 3), "baz"),
    );
    assert!(found.is_empty());
}

#[test]
fn test_max_suggestions_caps_results() {
    let text = "let v = 1;\nv += v;\nv += v;\nv += v;\n";
    let config = MatchConfig {
        max_suggestions: 2,
        ..MatchConfig::default()
    };
    let (_, found) = matches_for(
        config,
        Language::Rust,
        text,
        TextEdit::replace(span_of_nth(text, "v", 0), "total"),
    );
    assert_eq!(found.len(), 2);
}

#[test]
fn test_array_insert_mirrors_into_matching_list() {
    let text = "const LEVELS = [\"critical\", \"warning\"];\nconst ALERT_TYPES = [\"critical\", \"warning\"];\n";
    let at = span_of_nth(text, "\"warning\"", 0).end;
    let (after, found) = matches_for(
        MatchConfig::default(),
        Language::TypeScript,
        text,
        TextEdit::insert(at, ", \"debug\""),
    );

    assert_eq!(found.len(), 1);
    let candidate = &found[0];
    assert_eq!(candidate.placement, Placement::After);
    assert_eq!(candidate.payload, ", \"debug\"");
    assert_eq!(candidate.anchor, "\"warning\"");
    assert_eq!(candidate.target, span_of_nth(&after, "\"warning\"", 1));
    assert_eq!(candidate.confidence, Confidence::High);
}

#[test]
fn test_array_insert_skips_lists_that_already_have_it() {
    let text = "const A = [\"warning\"];\nconst B = [\"warning\", \"debug\"];\n";
    let at = span_of_nth(text, "\"warning\"", 0).end;
    let (_, found) = matches_for(
        MatchConfig::default(),
        Language::TypeScript,
        text,
        TextEdit::insert(at, ", \"debug\""),
    );
    assert!(found.is_empty());
}

#[test]
fn test_object_insert_anchors_on_same_key() {
    let text = "const ok = { status: 200 };\nconst fail = { status: 500 };\n";
    let at = span_of_nth(text, "200", 0).end;
    let (after, found) = matches_for(
        MatchConfig::default(),
        Language::TypeScript,
        text,
        TextEdit::insert(at, ", timestamp: Date.now()"),
    );

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].anchor, "status: 500");
    assert_eq!(found[0].payload, ", timestamp: Date.now()");
    assert_eq!(found[0].confidence, Confidence::Medium);
    assert_eq!(&after[found[0].target.range()], "status: 500");
}

#[test]
fn test_union_insert_descends_nested_unions() {
    let text = "type A = \"ok\" | \"error\";\ntype B = \"ok\" | \"error\";\n";
    let at = span_of_nth(text, "\"error\"", 0).end;
    let (after, found) = matches_for(
        MatchConfig::default(),
        Language::TypeScript,
        text,
        TextEdit::insert(at, " | \"pending\""),
    );

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].placement, Placement::After);
    assert_eq!(found[0].payload, " | \"pending\"");
    assert_eq!(found[0].target, span_of_nth(&after, "\"error\"", 1));
}

#[test]
fn test_delete_takes_the_leading_separator_along() {
    let text = "const a = [\"a\", \"b\", \"c\"];\nconst b = [\"x\", \"c\"];\n";
    let removed = span_of_nth(text, ", \"c\"", 0);
    let (after, found) = matches_for(
        MatchConfig::default(),
        Language::TypeScript,
        text,
        TextEdit::delete(removed),
    );

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].placement, Placement::Replace);
    assert!(found[0].payload.is_empty());
    assert_eq!(&after[found[0].target.range()], ", \"c\"");
}

#[test]
fn test_insert_presence_needs_a_token_boundary() {
    let text = "const a = [1];\nconst b = [1, 23];\nconst c = [1];\n";
    let at = span_of_nth(text, "1", 0).end;
    let (after, found) = matches_for(
        MatchConfig::default(),
        Language::TypeScript,
        text,
        TextEdit::insert(at, ", 2"),
    );
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].target, span_of_nth(&after, "1", 1));
    assert_eq!(found[1].target, span_of_nth(&after, "1", 2));

    let text = "f(a);\nf(a, bar);\nf(a);\n";
    let at = span_of_nth(text, "a", 0).end;
    let (_, found) = matches_for(
        MatchConfig::default(),
        Language::TypeScript,
        text,
        TextEdit::insert(at, ", b"),
    );
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|c| c.anchor == "a" && c.payload == ", b"));
}

#[test]
fn test_insert_at_list_head_goes_before_next_element() {
    let text = "const a = [\"w\"];\nconst b = [\"w\"];\n";
    let at = span_of_nth(text, "\"w\"", 0).start;
    let (after, found) = matches_for(
        MatchConfig::default(),
        Language::TypeScript,
        text,
        TextEdit::insert(at, "\"d\", "),
    );

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].placement, Placement::Before);
    assert_eq!(found[0].anchor, "\"w\"");
    assert_eq!(found[0].payload, "\"d\", ");
    assert_eq!(found[0].target, span_of_nth(&after, "\"w\"", 1));

    let mut mirrored = after.clone();
    mirrored.insert_str(found[0].target.start, &found[0].payload);
    assert_eq!(mirrored, "const a = [\"d\", \"w\"];\nconst b = [\"d\", \"w\"];\n");
}

#[test]
fn test_delete_takes_the_trailing_separator_along() {
    let text = "const a = [\"a\", \"b\"];\nconst b = [\"a\", \"c\"];\n";
    let removed = span_of_nth(text, "\"a\", ", 0);
    let (after, found) = matches_for(
        MatchConfig::default(),
        Language::TypeScript,
        text,
        TextEdit::delete(removed),
    );

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].anchor, "\"a\", ");
    let mut mirrored = after.clone();
    mirrored.replace_range(found[0].target.range(), "");
    assert_eq!(mirrored, "const a = [\"b\"];\nconst b = [\"c\"];\n");
}

#[test]
fn test_multi_token_rename_matches_same_kind_nodes() {
    let text = "log(user.name);\nsend(user.name);\nuser.names;\n";
    let (after, found) = matches_for(
        MatchConfig::default(),
        Language::TypeScript,
        text,
        TextEdit::replace(span_of_nth(text, "user.name", 0), "label"),
    );

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].role, Role::Other);
    assert_eq!(found[0].confidence, Confidence::Medium);
    assert_eq!(found[0].target, span_of_nth(&after, "user.name", 0));
    assert_eq!(found[0].payload, "label");
}

#[test]
fn test_property_rename_follows_destructured_binding() {
    let text = "interface P {\n  on: boolean;\n}\nconst T = ({ on }: P) => (on ? 1 : 0);\nconst other = { on: 1 };\n";
    let (after, found) = matches_for(
        MatchConfig::default(),
        Language::TypeScript,
        text,
        TextEdit::replace(span_of_nth(text, "on", 0), "enabled"),
    );

    let roles: Vec<_> = found.iter().map(|c| (c.role, c.confidence)).collect();
    assert_eq!(
        roles,
        vec![
            (Role::Property, Confidence::High),
            (Role::Identifier, Confidence::Medium),
            (Role::Identifier, Confidence::Medium),
        ]
    );
    assert!(found.iter().all(|c| &after[c.target.range()] == "on"));
}
