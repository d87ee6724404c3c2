//! End-to-end tests over a real transcription sample.
//!
//! The sample is one page of a 1574 lute print, encoded with OCR
//! position comments after most tab words.

use parsetab::{
    parse, parse_with_options, Event, Notation, ParseOptions, Scanner, TabError,
};

const SAMPLE_PAGE: &str = r#"{<rules>
 <notation>french</notation>
<pitch>67</pitch>
<tuning>( -5 -5 -4 -5 -5 -2 -1 -2 -2 -1 -2)</tuning>
</rules>}

 {6:"c6"=(218,320,242,348;6,66,88)} {6:"b6"=(281,310,304,336;7,130,209)} {6:"c6"=(306,320,321,337;8,35,13)} {6:"a6"=(322,317,357,339;8,195,73)} M(C/) {6:"k6"=(361,305,383,337;10,3,193)} [[b2d3a5{2:"b2"=(487,162,509,189;11,68,57)3:"d3"=(476,200,503,226;11,228,117)5:"a5"=(480,274,503,296;12,132,177)} ]]b2d3{2:"b2"=(523,162,547,189;13,36,237)3:"d3"=(515,199,540,225;13,197,41)} |{BAR:"|"=(553,132,563,299;14,101,102)} [[a2b3a4d6{2:"a2"=(578,168,594,188;15,165,222)3:"b3"=(578,197,601,225;16,70,26)4:"a4"=(576,238,596,258;16,230,86)6:"d6"=(573,304,606,332;17,134,146)} a1a2b3a6{1:"a1"=(614,131,634,151;18,38,206)2:"a2"=(613,167,630,188;18,199,10)3:"b3"=(615,196,638,225;19,103,70)6:"a6"=(615,308,641,330;20,7,130)} a1a2a3c5{1:"a1"=(651,131,671,154;20,167,190)2:"a2"=(650,168,671,189;21,71,250)3:"a3"=(651,203,670,224;21,232,55)5:"c5"=(651,272,670,297;22,136,115)} ]]e2a3c5{2:"e2"=(690,166,704,189;23,40,175)3:"a3"=(686,204,705,225;23,200,235)5:"c5"=(687,273,704,299;24,105,39)} |{BAR:"|"=(718,130,727,297;25,9,99)} Qa1a2c3a6{FLAG:"Q"=(745,72,771,121;25,169,159)1:"a1"=(739,134,759,155;26,73,219)2:"a2"=(739,170,760,191;26,234,23)3:"c3"=(743,203,760,227;27,138,83)6:"a6"=(731,311,762,334;28,42,143)} |:{BAR:"|"=(772,132,780,299;28,202,204)} |{BAR:"|"=(826,134,835,301;31,235,248)} [[a1a2b3a6{1:"a1"=(849,134,869,156;33,44,112)2:"a2"=(848,171,869,191;33,204,172)3:"b3"=(850,200,874,229;34,108,232)6:"a6"=(840,312,872,335;35,13,36)} ]]a1{1:"a1"=(884,135,905,157;35,173,97)} |{BAR:"|"=(918,134,926,301;36,77,157)} [[b2d3a5{2:"b2"=(943,164,966,192;37,142,21)3:"d3"=(935,202,960,229;38,46,81)5:"a5"=(938,275,961,298;38,206,141)} d3{3:"d3"=(971,201,998,229;39,110,201)} d2d3a4{2:"d2"=(1009,166,1035,193;40,15,5)3:"d3"=(1010,201,1036,228;40,175,65)4:"a4"=(1013,240,1037,262;41,79,125)} ]]d2{2:"d2"=(1048,166,1073,193;41,239,185)} |{BAR:"|"=(1084,134,1097,300;42,143,245)} [[a2c3a6{2:"a2"=(1108,167,1131,189;43,208,110)3:"c3"=(1110,201,1130,226;44,112,170)6:"a6"=(1102,308,1133,331;45,16,230)} c3{3:"c3"=(1147,201,1165,225;45,177,34)} d3c4a5{3:"d3"=(1175,200,1199,227;46,81,94)4:"c4"=(1183,238,1203,262;46,241,154)5:"a5"=(1179,275,1202,298;47,145,214)} ]]b2d3a5{2:"b2"=(1224,163,1246,190;48,50,18)3:"d3"=(1216,201,1237,228;48,210,78)5:"a5"=(1216,275,1237,297;49,114,138)} |{BAR:"|"=(1251,131,1264,297;50,18,199)} [[a2c3a6{2:"a2"=(1275,168,1295,188;51,83,63)3:"c3"=(1277,202,1293,225;51,243,123)6:"a6"=(1269,310,1298,332;52,147,183)} d3c6{3:"d3"=(1306,199,1329,227;53,51,243)6:"c6"=(1304,309,1338,334;53,212,47)} a4{4:"a4"=(1348,240,1369,261;54,116,107)} ]]c3c4a6{3:"c3"=(1389,202,1410,227;55,20,167)4:"c4"=(1388,238,1406,261;55,180,227)6:"a6"=(1380,310,1417,333;56,85,31)} |{BAR:"|"=(1421,131,1432,296;56,245,92)} Qd3c4a5{FLAG:"Q"=(1437,71,1463,120;57,149,152)3:"d3"=(1440,199,1462,226;58,53,212)4:"c4"=(1446,238,1462,261;58,214,16)5:"a5"=(1440,274,1461,297;59,118,76)} |:{BAR:"|"=(1476,129,1487,297;60,182,196)} |{BAR:"|"=(1529,131,1543,299;63,215,240)}
"#;

#[test]
fn test_sample_round_trips_through_the_scanner() {
    let tokens: Vec<_> = Scanner::new(SAMPLE_PAGE)
        .collect::<Result<Vec<_>, _>>()
        .expect("sample should tokenise");
    let joined: String = tokens.iter().map(|t| t.code).collect();
    assert_eq!(joined, SAMPLE_PAGE);
}

#[test]
fn test_sample_parses() {
    let events = parse(SAMPLE_PAGE).expect("sample should parse");

    // The page opens with its ruleset block.
    let Event::Ruleset(ruleset) = &events[0] else {
        panic!("expected a leading ruleset event");
    };
    assert_eq!(ruleset.fields.notation, Notation::French);
    assert_eq!(ruleset.fields.pitch, 67);
    assert_eq!(
        ruleset.fields.tuning.as_deref(),
        Some("( -5 -5 -4 -5 -5 -2 -1 -2 -2 -1 -2)")
    );
    // The listed tuning restates the reference tuning exactly.
    assert_eq!(
        ruleset.full_tuning(),
        [67, 62, 57, 53, 48, 43, 41, 40, 38, 36, 35, 33, 31]
    );

    // One metre change.
    let metres: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, Event::Metre { .. }))
        .collect();
    assert_eq!(metres.len(), 1);
    let Event::Metre {
        components,
        vertical,
        ..
    } = metres[0]
    else {
        unreachable!()
    };
    assert_eq!(components, &vec!["C/".to_string()]);
    assert!(!(*vertical));

    // Barlines number consecutively from one.
    let bar_nums: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            Event::Barline { bar_num, .. } => Some(*bar_num),
            _ => None,
        })
        .collect();
    assert!(!bar_nums.is_empty());
    assert_eq!(bar_nums, (1..=bar_nums.len()).collect::<Vec<_>>());

    // Every chord carries the raw text of its pitches, and every pitch
    // resolves through the page's ruleset.
    for event in &events {
        if let Event::Chord {
            main_courses,
            bass_courses,
            ..
        } = event
        {
            assert!(!main_courses.is_empty() || !bass_courses.is_empty());
            for note in main_courses {
                assert_eq!(note.pitch.ruleset.as_deref(), Some(ruleset));
            }
        }
    }
}

#[test]
fn test_sample_comments_can_be_stripped() {
    let options = ParseOptions {
        comments: false,
        ..Default::default()
    };
    let events = parse_with_options(SAMPLE_PAGE, &options).expect("sample should parse");
    assert!(events.iter().all(|e| !matches!(e, Event::Comment { .. })));

    let with_comments = parse(SAMPLE_PAGE).expect("sample should parse");
    assert!(with_comments
        .iter()
        .any(|e| matches!(e, Event::Comment { .. })));

    // Stripping comments changes nothing else.
    let stripped: Vec<_> = with_comments
        .into_iter()
        .filter(|e| !matches!(e, Event::Comment { .. }))
        .collect();
    assert_eq!(events, stripped);
}

#[test]
fn test_sample_durations_carry_forward() {
    let events = parse(SAMPLE_PAGE).expect("sample should parse");
    // The first flagged word is the crotchet chord Qa1a2c3a6; chords
    // before it have no duration at all.
    let durations: Vec<Option<String>> = events
        .iter()
        .filter_map(|e| match e {
            Event::Chord { duration, .. } => {
                Some(duration.as_ref().map(|d| d.code.clone()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(durations[0], None);
    assert!(durations.contains(&Some("Q".to_string())));
}

#[test]
fn test_counters_shift_with_configuration() {
    let options = ParseOptions {
        page_num: 3,
        sys_num: 5,
        bar_num: 17,
        ..Default::default()
    };
    let events = parse_with_options("{>} {^} | {^} |", &options).unwrap();
    assert_eq!(
        events,
        vec![
            Event::PageBreak {
                code: "{>}".to_string(),
                page_num: 3
            },
            Event::SystemBreak {
                code: "{^}".to_string(),
                sys_num: 5
            },
            Event::Barline {
                code: "|".to_string(),
                bar_num: 17,
                flags: Default::default()
            },
            Event::SystemBreak {
                code: "{^}".to_string(),
                sys_num: 6
            },
            Event::Barline {
                code: "|".to_string(),
                bar_num: 18,
                flags: Default::default()
            },
        ]
    );
}

#[test]
fn test_events_serialise_to_tagged_json() {
    let events = parse("{a comment} Qa1 | W").unwrap();
    let json = serde_json::to_value(&events).unwrap();
    let tags: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["type"].as_str().unwrap())
        .collect();
    assert_eq!(tags, vec!["Comment", "Chord", "Barline", "Rest"]);

    // Raw text survives serialisation for a lossless record.
    assert_eq!(json[0]["code"], "{a comment}");
    assert_eq!(json[1]["main_courses"][0]["pitch"]["code"], "a1");
    assert_eq!(json[2]["code"], "|");
    assert_eq!(json[3]["duration"]["code"], "W");
}

#[test]
fn test_errors_abort_the_whole_parse() {
    assert!(matches!(
        parse("Qa1 | ?"),
        Err(TabError::Scan { symbol: '?', .. })
    ));
    assert!(matches!(
        parse("Qa1 {never closed"),
        Err(TabError::UnbalancedComment { .. })
    ));
    assert!(matches!(parse("Qa1 ."), Err(TabError::Grammar { .. })));
}

#[test]
fn test_ruleset_redefinition_mid_piece() {
    let source = "{<rules><notation>italian</notation></rules>} a1 \
                  {<rules><pitch>68</pitch></rules>} a1";
    let events = parse(source).unwrap();

    let chords: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::Chord { main_courses, .. } => Some(&main_courses[0]),
            _ => None,
        })
        .collect();
    assert_eq!(chords.len(), 2);

    let first = chords[0].pitch.ruleset.as_deref().unwrap();
    let second = chords[1].pitch.ruleset.as_deref().unwrap();
    assert_eq!(first.fields.notation, Notation::Italian);
    assert_eq!(first.fields.pitch, 67);
    // The second block inherits the notation and overrides the pitch.
    assert_eq!(second.fields.notation, Notation::Italian);
    assert_eq!(second.fields.pitch, 68);
    assert_eq!(second.full_tuning()[0], 68);
}
