/// Phrases researched when `derive` is given none: people from computing,
/// mathematics and machine learning.
pub const DEFAULT_PHRASES: &[&str] = &[
    "Larry Page",
    "Sebastian Thrun",
    "Andrew Ng",
    "Yoshua Bengio",
    "Yann LeCun",
    "Geoffrey Hinton",
    "Jürgen Schmidhuber",
    "Bruno Olshausen",
    "J.J. Hopfield",
    "Randall O'Reilly",
    "Demis Hassabis",
    "Peter Norvig",
    "Jeff Dean",
    "Daphne Koller",
    "David Blei",
    "Gunnar Carlson",
    "Julia Hirschberg",
    "Liangliang Cao",
    "Rocco Servedio",
    "Leslie Valiant",
    "Vladimir Vapnik",
    "Alan Turing",
    "Georg Cantor",
    "Alan Kay",
    "Thomas Bayes",
    "Ludwig Boltzmann",
    "William Rowan Hamilton",
    "Peter Dirichlet",
    "Carl Gauss",
    "Donald Knuth",
    "Gordon Moore",
    "Claude Shannon",
    "Marvin Minsky",
    "John McCarthy",
    "John von Neumann",
    "Thomas J. Watson",
    "Ken Thompson",
    "Linus Torvalds",
    "Dennis Ritchie",
    "Douglas Engelbart",
    "Grace Hopper",
    "Marissa Mayer",
    "Bill Gates",
    "Steve Jobs",
    "Steve Wozniak",
    "Jeff Bezos",
    "Mark Zuckerberg",
    "Eric Schmidt",
    "Sergey Brin",
    "Tim Berners Lee",
    "Stephen Wolfram",
    "Bill Joy",
    "Michael I. Jordan",
    "Vint Cerf",
    "Paul Graham",
    "Richard Hamming",
    "Eric Horvitz",
    "Stephen Omohundro",
    "Jaron Lanier",
    "Bruce Schneier",
    "Ray Kurzweil",
    "Richard Socher",
    "Alex Krizhevsky",
    "Rajat Raina",
    "Adam Coates",
    "Léon Bottou",
    "Greg Corrado",
    "Marc'Aurelio Ranzato",
    "Honglak Lee",
    "Quoc V. Le",
    "Radim Řehůřek",
    "Tom De Smedt",
    "Chris Moody",
    "Christopher Olah",
    "Tomas Mikolov",
];
