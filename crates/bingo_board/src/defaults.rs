//! Built-in prompt list used when a session brings no pool of its own.

pub(crate) const BUILTIN_PROMPTS: &[&str] = &[
    "Someone arrives late",
    "A phone rings out loud",
    "Someone spills a drink",
    "A toast is given",
    "Someone takes a group photo",
    "Someone mentions the weather",
    "A song gets requested",
    "Someone sings along",
    "Someone starts dancing",
    "A pet makes an appearance",
    "Someone tells a bad joke",
    "Someone laughs until they cry",
    "An inside joke is explained",
    "Someone forgets a name",
    "Someone asks for the wifi password",
    "A board game comes out",
    "Someone orders food",
    "Pizza is mentioned",
    "Someone checks the score of a game",
    "A high five happens",
    "Someone hugs the host",
    "A story starts with 'one time'",
    "Someone does an impression",
    "A birthday is mentioned",
    "Someone shows a video on their phone",
    "Someone talks about their commute",
    "A movie quote is used",
    "Someone yawns",
    "Someone leaves early",
    "A glass is clinked",
    "Someone takes a selfie",
    "Someone brings dessert",
    "Someone compliments the music",
    "The lights get dimmed",
    "Someone loses their keys",
    "A travel story is told",
    "Someone mentions a podcast",
    "Someone recommends a show",
    "A debate about movies starts",
    "Someone says 'no way'",
    "Someone arrives with flowers",
    "Someone wears the same color as you",
    "A chair gets borrowed from another room",
    "Someone mentions their plants",
    "Someone talks about a new hobby",
    "Someone checks the time",
    "Someone offers to help clean up",
    "A snack bowl runs empty",
    "Someone tells a childhood story",
    "Someone mispronounces a word",
    "A card trick is performed",
    "Someone mentions a diet",
    "Someone brags about a recipe",
    "Someone shares embarrassing photos",
    "A game gets too competitive",
    "Someone calls a rideshare",
    "Someone steps outside for air",
    "Someone mentions a concert",
    "A phone battery dies",
    "Someone borrows a charger",
    "Someone talks about sports",
    "Someone quotes a meme",
    "Someone asks 'what time is it?'",
    "A new person gets introduced",
    "Someone counts down out loud",
    "Someone whistles",
    "A speech gets interrupted",
    "Someone stands on a chair",
    "A cake is cut",
    "Someone refuses a second helping",
    "Someone asks for seconds",
    "Someone talks about the traffic",
    "Someone gives directions",
    "Someone says 'I'm so full'",
    "Someone brings a guitar",
    "A playlist gets changed",
    "Someone drops food on the floor",
    "Someone mentions a wedding",
    "Someone shows off a tattoo",
    "Somebody falls asleep",
    "A group chat gets mentioned",
    "Someone reads a text out loud",
    "Someone talks about a vacation",
    "Someone asks about a job",
    "A rumor gets shared",
    "Someone does a magic trick",
    "Someone tells a ghost story",
    "The doorbell rings",
    "Someone plays air guitar",
    "Someone mentions the full moon",
    "Someone challenges another to arm wrestling",
    "Someone sits on the floor",
    "A candle gets lit",
    "Someone brings homemade snacks",
    "Someone blames autocorrect",
    "Someone claps at the wrong time",
    "Someone says 'back in my day'",
    "A nickname gets invented",
    "Someone forgets why they walked in",
    "Someone wears sunglasses inside",
    "Someone sneezes",
    "Someone hums a tune",
    "A conversation turns to aliens",
    "Someone rearranges the furniture",
    "Someone gets a phone call and leaves the room",
    "Someone asks for a napkin",
    "Someone says 'let's do this again'",
    "A photo gets retaken",
    "Someone spells a word out loud",
    "Someone mentions their grandparents",
    "Someone talks about a dream they had",
    "Someone looks for the bathroom",
    "Someone brings up a conspiracy theory",
    "Someone imitates an animal",
    "A balloon pops",
    "Someone tries a new drink",
    "Someone admits they are tired",
    "Someone volunteers to drive",
    "Someone gets the hiccups",
    "Someone says goodbye twice",
];
