//! End-to-end conversation scenarios against a small rule source.

use crate::{Bot, BotProfile, Options, Outcome, Session};
use std::collections::HashSet;
use std::sync::Arc;

const FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<aiml version="1.0">
  <category>
    <pattern>WHAT IS YOUR NAME</pattern>
    <template>My name is <bot name="name"/>.</template>
  </category>
  <category>
    <pattern>MY NAME IS *</pattern>
    <template>Hey <set name="name"><star/></set>!</template>
  </category>
  <category>
    <pattern>WHAT IS MY NAME</pattern>
    <template>Your name is <get name="name"/>.</template>
  </category>
  <category>
    <pattern>IS MY NAME <get name="name"/></pattern>
    <template>Yes.</template>
  </category>
  <category>
    <pattern>ARE YOU <bot name="name"/></pattern>
    <template>Yes, that is me.</template>
  </category>
  <category>
    <pattern>WHO ARE YOU</pattern>
    <template><srai>WHAT IS YOUR NAME</srai></template>
  </category>
  <category>
    <pattern>GIVE ME A LETTER</pattern>
    <template>
      <random>
        <li>A</li>
        <li>B</li>
        <li>C</li>
      </random>
    </template>
  </category>
  <category>
    <pattern>TEST SRAI IN RANDOM</pattern>
    <template>
      <random>
        <li><srai>WHAT IS YOUR NAME</srai></li>
        <li><srai>WHAT IS MY NAME</srai></li>
      </random>
    </template>
  </category>
  <category>
    <pattern>TEST WILDCARD *</pattern>
    <template>Thanks for testing!</template>
  </category>
  <category>
    <pattern>TEST SR *</pattern>
    <template><sr/></template>
  </category>
  <category>
    <pattern>ECHO *</pattern>
    <template><star/></template>
  </category>
  <category>
    <pattern>TEST THE THAT TAG</pattern>
    <template>I start testing that.</template>
  </category>
  <category>
    <pattern>TEST THAT-TAG. MATCH</pattern>
    <that>I START TESTING THAT</that>
    <template>That matched quite well!</template>
  </category>
  <category>
    <pattern>TEST THAT-TAG. DONT MATCH</pattern>
    <that>SOMETHING ELSE ENTIRELY</that>
    <template>This should never be said.</template>
  </category>
  <category>
    <pattern>HOW ARE YOU</pattern>
    <template>Are you ok?</template>
  </category>
  <category>
    <pattern>GREET ME</pattern>
    <template>Hello, Ben!</template>
  </category>
  <category>
    <pattern>GREET ME PLAINLY</pattern>
    <template>Hello Ben!</template>
  </category>
  <category>
    <pattern>YES</pattern>
    <that>ARE YOU OK</that>
    <template>Glad to hear it.</template>
  </category>
  <category>
    <pattern>YES</pattern>
    <that>HELLO BEN</that>
    <template>Greeted.</template>
  </category>
  <category>
    <pattern>YES</pattern>
    <template>Yes what?</template>
  </category>
  <category>
    <pattern>YOU FEEL *</pattern>
    <template><think><set name="mood"><star/></set></think>I feel <get name="mood"/>!</template>
  </category>
  <category>
    <pattern>WHAT IS YOUR FEELING TODAY</pattern>
    <template>
      <condition name="mood">
        <li value="happy">Feeling happy!</li>
        <li value="sad">Feeling sad today</li>
        <li>I don't feel anything</li>
      </condition>
    </template>
  </category>
  <category>
    <pattern>HOW ARE YOU FEELING TODAY</pattern>
    <template>
      <condition name="mood" value="happy">I am happy!</condition>
      <condition name="mood" value="sad">I am sad!</condition>
    </template>
  </category>
  <category>
    <pattern>TELL ME ABOUT YOUR FEELINGS</pattern>
    <template>
      <condition>
        <li name="mood" value="happy">I am happy!</li>
        <li name="mood" value="sad">I am sad!</li>
        <li>I kinda feel nothing <srai>WHAT IS YOUR NAME</srai></li>
      </condition>
    </template>
  </category>
  <category>
    <pattern>EXPLAIN _</pattern>
    <template>Sorry, I do not have a clue</template>
  </category>
  <category>
    <pattern>EXPLAIN HANA</pattern>
    <template>An in-memory database.</template>
  </category>
  <category>
    <pattern>I AM * YEARS OLD</pattern>
    <template><think><set name="age"><star/></set></think>Noted.</template>
  </category>
  <category>
    <pattern>HOW OLD AM I</pattern>
    <template>You are <get name="age"/></template>
  </category>
  <category>
    <pattern>REMEMBER * AND *</pattern>
    <template><think><set name="first"><star/></set><set name="second">*</set></think>Got <get name="first"/> and <get name="second"/>, <star/> last.</template>
  </category>
  <category>
    <pattern>DO UPPERCASE *</pattern>
    <template>Hello <uppercase><star/></uppercase></template>
  </category>
  <category>
    <pattern>DO LOWERCASE *</pattern>
    <template>Hello <lowercase><star/></lowercase></template>
  </category>
  <category>
    <pattern>DO FORMAL CASE *</pattern>
    <template>Hello <formal><star/></formal></template>
  </category>
  <category>
    <pattern>DO SENTENCE *</pattern>
    <template><sentence><star/></sentence> is the best.</template>
  </category>
  <category>
    <pattern>I LIKE GIFS</pattern>
    <template>GIF this: <img src="GIF"/></template>
  </category>
  <category>
    <pattern>SUPPORT BR TAGS</pattern>
    <template>This<br/>is<br/>a<br/>bot.</template>
  </category>
  <category>
    <pattern>MULTI LINE</pattern>
    <template>
      I am
      happy!
    </template>
  </category>
  <category>
    <pattern>NESTED</pattern>
    <template><template>Inner</template></template>
  </category>
  <category>
    <pattern>OUTER KEEP *</pattern>
    <template><srai>CHAIN THREE</srai> Still <star/>.</template>
  </category>
  <category>
    <pattern>OUTER *</pattern>
    <template><srai>ECHO INNER</srai> then <star/></template>
  </category>
  <category>
    <pattern>SET NOTHING</pattern>
    <template>x<set name="v"/>y</template>
  </category>
  <category>
    <pattern>REDIRECT NOWHERE</pattern>
    <template>Before <srai>NOTHING MATCHES THIS</srai>after</template>
  </category>
  <category>
    <pattern>SR WITHOUT WILDCARD</pattern>
    <template>Start <sr/>end</template>
  </category>
  <category>
    <pattern>LOOP A</pattern>
    <template><srai>LOOP B</srai></template>
  </category>
  <category>
    <pattern>LOOP B</pattern>
    <template><think><set name="looped">yes</set></think><srai>LOOP A</srai></template>
  </category>
  <category>
    <pattern>CHAIN ONE</pattern>
    <template><srai>CHAIN TWO</srai></template>
  </category>
  <category>
    <pattern>CHAIN TWO</pattern>
    <template><srai>CHAIN THREE</srai></template>
  </category>
  <category>
    <pattern>CHAIN THREE</pattern>
    <template>End of chain.</template>
  </category>
</aiml>
"#;

fn bot() -> Arc<Bot> {
    let bot = Arc::new(Bot::new(BotProfile::new([("name", "WireInterpreter"), ("age", "42")])));
    bot.load_str(FIXTURE).unwrap();
    bot
}

fn session_with(options: Options) -> Session {
    Session::with_options(bot(), options)
}

fn session() -> Session {
    session_with(Options { seed: Some(7), ..Options::default() })
}

fn ask(session: &mut Session, input: &str) -> Option<String> {
    session.resolve_now(input).unwrap().answer
}

#[test]
fn fixture_loads_every_category() {
    assert_eq!(bot().category_count(), 47);
}

#[test]
fn bot_attributes_are_substituted() {
    let mut s = session();
    assert_eq!(ask(&mut s, "What is your name?").as_deref(), Some("My name is WireInterpreter."));
}

#[test]
fn set_then_get_across_turns() {
    let mut s = session();
    let answer = s.resolve_now("My name is Ben.").unwrap();
    assert_eq!(answer.answer.as_deref(), Some("Hey Ben!"));
    assert_eq!(answer.wildcard_captures, vec!["BEN"]);
    assert_eq!(s.state().wildcard_captures(), ["Ben"]);
    assert_eq!(s.state().last_wildcard(), "Ben");

    assert_eq!(ask(&mut s, "What is my name?").as_deref(), Some("Your name is Ben."));
}

#[test]
fn pattern_references_are_resolved_per_request() {
    let mut s = session();
    assert_eq!(ask(&mut s, "Are you WireInterpreter?").as_deref(), Some("Yes, that is me."));

    assert_eq!(ask(&mut s, "Is my name Ben?"), None);
    ask(&mut s, "My name is Ben");
    assert_eq!(ask(&mut s, "Is my name Ben?").as_deref(), Some("Yes."));
    assert_eq!(ask(&mut s, "Is my name Tim?"), None);
}

#[test]
fn srai_is_equivalent_to_asking_directly() {
    let mut s = session();
    let direct = s.resolve_now("What is your name").unwrap();
    let redirected = s.resolve_now("Who are you?").unwrap();

    assert_eq!(direct.answer, redirected.answer);
    assert_eq!(redirected.metrics.redirects, 1);
    assert_eq!(redirected.metrics.max_depth, 1);
    assert_eq!(redirected.matched.unwrap().pattern, "WHO ARE YOU");
}

#[test]
fn random_picks_every_alternative() {
    let mut s = session();
    let mut seen = HashSet::new();
    for _ in 0..200 {
        let answer = ask(&mut s, "Give me a letter.").unwrap();
        assert!(["A", "B", "C"].contains(&answer.as_str()), "unexpected letter {answer}");
        seen.insert(answer);
    }
    assert_eq!(seen.len(), 3);
}

#[test]
fn random_is_reproducible_with_a_seed() {
    let run = |seed| {
        let mut s = session_with(Options { seed: Some(seed), ..Options::default() });
        (0..20).map(|_| ask(&mut s, "Give me a letter").unwrap()).collect::<Vec<_>>()
    };
    assert_eq!(run(42), run(42));
}

#[test]
fn srai_inside_random() {
    let mut s = session();
    ask(&mut s, "My name is Ben.");
    for _ in 0..20 {
        let answer = ask(&mut s, "Test srai in random.").unwrap();
        assert!(
            answer == "My name is WireInterpreter." || answer == "Your name is Ben.",
            "unexpected answer {answer}"
        );
    }
}

#[test]
fn wildcard_swallows_a_whole_question() {
    let mut s = session();
    let answer = s.resolve_now("Test wildcard What is my name?").unwrap();
    assert_eq!(answer.answer.as_deref(), Some("Thanks for testing!"));
    assert_eq!(answer.wildcard_captures, vec!["WHAT IS MY NAME"]);
}

#[test]
fn sr_redirects_on_the_last_capture() {
    let mut s = session();
    ask(&mut s, "My name is Ben.");
    let answer = s.resolve_now("Test sr What is my name").unwrap();

    assert_eq!(answer.answer.as_deref(), Some("Your name is Ben."));
    // nested scans do not overwrite the top-level captures
    assert_eq!(answer.wildcard_captures, vec!["WHAT IS MY NAME"]);
    assert_eq!(s.state().last_wildcard(), "What is my name");
}

#[test]
fn star_reads_the_most_recent_capture_of_the_request() {
    let mut s = session();
    let answer = s.resolve_now("outer first").unwrap();
    assert_eq!(answer.answer.as_deref(), Some("INNER then INNER"));
    assert_eq!(answer.wildcard_captures, vec!["FIRST"]);
    assert_eq!(s.state().wildcard_captures(), ["first"]);
    assert_eq!(s.state().last_wildcard(), "INNER");
}

#[test]
fn redirect_without_captures_keeps_the_last_wildcard() {
    let mut s = session();
    assert_eq!(ask(&mut s, "Outer keep going").as_deref(), Some("End of chain. Still going."));
    assert_eq!(s.state().last_wildcard(), "going");
}

#[test]
fn sr_without_a_wildcard_is_empty() {
    let mut s = session();
    ask(&mut s, "My name is Ben");

    let answer = s.resolve_now("SR without wildcard").unwrap();
    assert_eq!(answer.answer.as_deref(), Some("Start end"));
    assert_eq!(answer.metrics.redirects, 0);
    // the capture of the previous request does not leak into this one
    assert_eq!(s.state().last_wildcard(), "");
}

#[test]
fn srai_to_unmatched_input_adds_nothing() {
    let mut s = session();
    let answer = s.resolve_now("Redirect nowhere").unwrap();
    assert_eq!(answer.answer.as_deref(), Some("Before after"));
    assert_eq!(answer.outcome, Outcome::Matched);
    assert_eq!(answer.metrics.redirects, 1);
}

#[test]
fn set_without_value_stores_empty_string() {
    let mut s = session();
    s.update_state("v", "old");
    assert_eq!(ask(&mut s, "Set nothing").as_deref(), Some("xy"));
    assert_eq!(s.get_state("v"), Some(""));
}

#[test]
fn star_echoes_capture_with_input_casing() {
    let mut s = session();
    assert_eq!(ask(&mut s, "Echo What is my name?").as_deref(), Some("What is my name"));
}

#[test]
fn that_context_gates_categories() {
    let mut s = session();
    assert_eq!(ask(&mut s, "Test the that tag").as_deref(), Some("I start testing that."));
    assert_eq!(ask(&mut s, "Test that-tag. match").as_deref(), Some("That matched quite well!"));

    let rejected = s.resolve_now("Test that-tag. dont match").unwrap();
    assert_eq!(rejected.answer, None);
    assert_eq!(rejected.outcome, Outcome::NoMatch);
    assert_eq!(rejected.metrics.that_rejections, 1);
}

#[test]
fn that_context_falls_through_to_later_category() {
    let mut s = session();
    assert_eq!(ask(&mut s, "Yes").as_deref(), Some("Yes what?"));
    assert_eq!(ask(&mut s, "How are you?").as_deref(), Some("Are you ok?"));
    assert_eq!(ask(&mut s, "yes").as_deref(), Some("Glad to hear it."));
    assert_eq!(ask(&mut s, "yes").as_deref(), Some("Yes what?"));
}

#[test]
fn that_context_does_not_skip_punctuation_between_words() {
    let mut s = session();
    assert_eq!(ask(&mut s, "Greet me").as_deref(), Some("Hello, Ben!"));
    let answer = s.resolve_now("yes").unwrap();
    assert_eq!(answer.answer.as_deref(), Some("Yes what?"));
    assert_eq!(answer.metrics.that_rejections, 2);

    assert_eq!(ask(&mut s, "Greet me plainly").as_deref(), Some("Hello Ben!"));
    assert_eq!(ask(&mut s, "yes").as_deref(), Some("Greeted."));
}

#[test]
fn pattern_words_are_not_joined_by_punctuation() {
    let mut s = session();
    assert_eq!(ask(&mut s, "Greet, me"), None);
    assert_eq!(ask(&mut s, "Greet: me"), None);
    assert_eq!(ask(&mut s, "Greet me!").as_deref(), Some("Hello, Ben!"));
}

#[test]
fn condition_forms_follow_the_mood_variable() {
    let mut s = session();
    assert_eq!(ask(&mut s, "What is your feeling today?").as_deref(), Some("I don't feel anything"));
    assert_eq!(ask(&mut s, "How are you feeling today?"), None);
    assert_eq!(
        ask(&mut s, "Tell me about your feelings").as_deref(),
        Some("I kinda feel nothing My name is WireInterpreter.")
    );

    assert_eq!(ask(&mut s, "You feel crumpy").as_deref(), Some("I feel crumpy!"));
    assert_eq!(ask(&mut s, "What is your feeling today?").as_deref(), Some("I don't feel anything"));

    assert_eq!(ask(&mut s, "You feel happy").as_deref(), Some("I feel happy!"));
    assert_eq!(ask(&mut s, "How are you feeling today?").as_deref(), Some("I am happy!"));
    assert_eq!(ask(&mut s, "What is your feeling today?").as_deref(), Some("Feeling happy!"));
    assert_eq!(ask(&mut s, "Tell me about your feelings").as_deref(), Some("I am happy!"));

    assert_eq!(ask(&mut s, "You feel sad").as_deref(), Some("I feel sad!"));
    assert_eq!(ask(&mut s, "How are you feeling today?").as_deref(), Some("I am sad!"));
    assert_eq!(ask(&mut s, "What is your feeling today?").as_deref(), Some("Feeling sad today"));
    assert_eq!(ask(&mut s, "Tell me about your feelings").as_deref(), Some("I am sad!"));
}

#[test]
fn condition_values_compare_exactly() {
    let mut s = session();
    assert_eq!(ask(&mut s, "You feel HAPPY").as_deref(), Some("I feel HAPPY!"));
    assert_eq!(ask(&mut s, "What is your feeling today?").as_deref(), Some("I don't feel anything"));
}

#[test]
fn empty_template_result_is_no_answer() {
    let mut s = session();
    ask(&mut s, "How are you?");

    let answer = s.resolve_now("How are you feeling today?").unwrap();
    assert_eq!(answer.answer, None);
    assert_eq!(answer.outcome, Outcome::Empty);
    assert_eq!(answer.matched.map(|m| m.pattern), Some("HOW ARE YOU FEELING TODAY".to_string()));
    assert_eq!(s.save_previous_answer(), "Are you ok?");
}

#[test]
fn first_matching_category_wins() {
    let mut s = session();
    let answer = s.resolve_now("Explain HANA").unwrap();
    assert_eq!(answer.answer.as_deref(), Some("Sorry, I do not have a clue"));
    assert_eq!(answer.matched.unwrap().pattern, "EXPLAIN _");
}

#[test]
fn think_only_applies_side_effects() {
    let mut s = session();
    assert_eq!(ask(&mut s, "I am 123 years old").as_deref(), Some("Noted."));
    assert_eq!(s.get_state("age"), Some("123"));
    assert_eq!(ask(&mut s, "How old am I?").as_deref(), Some("You are 123"));
}

#[test]
fn set_of_wildcard_consumes_captures_in_order() {
    let mut s = session();
    let answer = ask(&mut s, "Remember apples and pears").unwrap();
    assert_eq!(answer, "Got apples and pears, pears last.");
    assert_eq!(s.get_state("first"), Some("apples"));
    assert_eq!(s.get_state("second"), Some("pears"));
}

#[test]
fn case_transforms() {
    let mut s = session();
    assert_eq!(ask(&mut s, "Do uppercase Greg Leuch").as_deref(), Some("Hello GREG LEUCH"));
    assert_eq!(ask(&mut s, "Do lowercase Greg Leuch").as_deref(), Some("Hello greg leuch"));
    assert_eq!(ask(&mut s, "Do formal case greg leuch").as_deref(), Some("Hello Greg Leuch"));
    assert_eq!(ask(&mut s, "Do sentence greg the botmaster").as_deref(), Some("Greg the botmaster is the best."));
}

#[test]
fn unknown_tags_and_line_breaks() {
    let mut s = session();
    assert_eq!(ask(&mut s, "I like GIFs").as_deref(), Some("GIF this: <img src=\"GIF\"/>"));
    assert_eq!(ask(&mut s, "Support BR tags").as_deref(), Some("This\nis\na\nbot."));
    assert_eq!(ask(&mut s, "multi line").as_deref(), Some("I am happy!"));
    assert_eq!(ask(&mut s, "nested").as_deref(), Some("Inner"));
}

#[test]
fn matching_ignores_case_but_rejects_noise() {
    let mut s = session();
    assert_eq!(ask(&mut s, "You feel BAD").as_deref(), Some("I feel BAD!"));
    assert_eq!(ask(&mut s, "You feel good").as_deref(), Some("I feel good!"));
    assert_eq!(ask(&mut s, "You feel g332-sdfds__#ood"), None);
    assert_eq!(ask(&mut s, "My name is nwbjks,-_??@$#mdnmdf"), None);
    assert_eq!(ask(&mut s, "My name is nwbjks-mdnmdf").as_deref(), Some("Hey nwbjks-mdnmdf!"));
}

#[test]
fn unmatched_input_has_no_answer() {
    let mut s = session();
    let answer = s.resolve_now("Test the wildcard pattern!").unwrap();
    assert_eq!(answer.answer, None);
    assert_eq!(answer.outcome, Outcome::NoMatch);
    assert!(answer.matched.is_none());
    assert_eq!(answer.metrics.categories_tried, s.bot().category_count());
}

#[test]
fn redirect_cycle_ends_with_limit() {
    let mut s = session();
    ask(&mut s, "How are you");

    let answer = s.resolve_now("Loop A").unwrap();
    assert_eq!(answer.answer, None);
    assert_eq!(answer.outcome, Outcome::RedirectionLimit);
    assert!(answer.metrics.redirect_limit_hit);
    assert_eq!(answer.metrics.max_depth, 32);

    // writes made before the guard fired stay, the previous answer does not move
    assert_eq!(s.get_state("looped"), Some("yes"));
    assert_eq!(s.save_previous_answer(), "Are you ok?");

    // the session keeps working afterwards
    assert_eq!(ask(&mut s, "Who are you").as_deref(), Some("My name is WireInterpreter."));
}

#[test]
fn redirect_depth_is_configurable() {
    let mut shallow = session_with(Options { max_redirect_depth: 1, ..Options::default() });
    assert_eq!(shallow.resolve_now("Chain one").unwrap().outcome, Outcome::RedirectionLimit);

    let mut deep = session_with(Options { max_redirect_depth: 2, ..Options::default() });
    assert_eq!(ask(&mut deep, "Chain one").as_deref(), Some("End of chain."));
}

#[test]
fn non_random_paths_are_deterministic() {
    let script = ["My name is Ben", "What is my name", "How are you", "yes", "You feel sad", "Tell me about your feelings"];
    let run = || {
        let mut s = Session::new(bot());
        script.iter().map(|input| ask(&mut s, input)).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn snapshot_restore_reproduces_that_matching() {
    let bot = bot();
    let mut first = Session::new(bot.clone());
    ask(&mut first, "My name is Ben");
    ask(&mut first, "How are you");
    let snapshot = first.snapshot();

    let mut second = Session::new(bot);
    second.restore(snapshot);
    assert_eq!(second.get_state("name"), Some("Ben"));
    assert_eq!(ask(&mut second, "yes").as_deref(), Some("Glad to hear it."));
}

#[test]
fn sessions_sharing_a_bot_keep_separate_state() {
    let bot = bot();
    let mut ben = Session::new(bot.clone());
    let mut tim = Session::new(bot);

    ask(&mut ben, "My name is Ben");
    ask(&mut tim, "My name is Tim");
    assert_eq!(ask(&mut ben, "What is my name").as_deref(), Some("Your name is Ben."));
    assert_eq!(ask(&mut tim, "What is my name").as_deref(), Some("Your name is Tim."));
}
